//! Transport layer.
//!
//! The engine only needs a request/response primitive over [`Payload`]s.
//! Two implementations ship with the crate:
//! - [`MemoryTransport`] routes requests to an in-process handler
//! - [`TcpClient`]/[`TcpServer`] carry payloads over length-prefixed TCP frames

pub mod client;
pub mod framing;
pub mod memory;
pub mod server;

pub use client::{ClientConfig, TcpClient};
pub use framing::{Frame, FrameCodec, FrameType};
pub use memory::MemoryTransport;
pub use server::{ServerConfig, TcpServer};

use crate::error::{Result, TransportError};
use crate::payload::Payload;
use async_trait::async_trait;
use std::sync::Arc;

/// Requester side of a transport: one payload out, one payload back.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Send a request and wait for its single reply.
    async fn request_response(
        &self,
        request: Payload,
    ) -> std::result::Result<Payload, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn request_response(
        &self,
        request: Payload,
    ) -> std::result::Result<Payload, TransportError> {
        (**self).request_response(request).await
    }
}

/// Responder side of a transport.
#[async_trait]
pub trait RequestHandler: Send + Sync + 'static {
    /// Produce the reply for one request.
    ///
    /// `Ok(None)` means the request is deliberately left unanswered.
    async fn handle(&self, request: Payload) -> Result<Option<Payload>>;
}

#[async_trait]
impl<H: RequestHandler + ?Sized> RequestHandler for Arc<H> {
    async fn handle(&self, request: Payload) -> Result<Option<Payload>> {
        (**self).handle(request).await
    }
}
