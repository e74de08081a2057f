//! In-memory transport implementation for testing
//!
//! Requests are routed to a handler living in the same process. Each request
//! is served on its own task, so concurrent exchanges do not block each
//! other.

use super::{RequestHandler, Transport};
use crate::error::{Result, TransportError};
use crate::payload::Payload;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

struct PendingRequest {
    request: Payload,
    reply: oneshot::Sender<Result<Option<Payload>>>,
}

/// Memory transport implementation
#[derive(Clone)]
pub struct MemoryTransport {
    requests: flume::Sender<PendingRequest>,
}

impl MemoryTransport {
    /// Create a transport delivering requests to `handler`.
    ///
    /// Must be called from within a Tokio runtime; the dispatch task ends once
    /// every clone of the transport is dropped.
    pub fn new<H: RequestHandler>(handler: H) -> Self {
        let handler = Arc::new(handler);
        let (requests, incoming) = flume::unbounded::<PendingRequest>();

        tokio::spawn(async move {
            while let Ok(pending) = incoming.recv_async().await {
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    let outcome = handler.handle(pending.request).await;
                    // The requester may have abandoned the exchange
                    if pending.reply.send(outcome).is_err() {
                        debug!("Dropping reply for abandoned memory exchange");
                    }
                });
            }
            debug!("Memory transport closed");
        });

        Self { requests }
    }
}

impl Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("queued", &self.requests.len())
            .finish()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn request_response(
        &self,
        request: Payload,
    ) -> std::result::Result<Payload, TransportError> {
        let (reply, reply_rx) = oneshot::channel();

        debug!(
            "Memory transport sending {} data / {} metadata bytes",
            request.data().len(),
            request.metadata().len()
        );

        self.requests
            .send_async(PendingRequest { request, reply })
            .await
            .map_err(|_| TransportError::ConnectionClosed)?;

        match reply_rx.await.map_err(|_| TransportError::ChannelClosed)? {
            Ok(Some(payload)) => Ok(payload),
            Ok(None) => Err(TransportError::NoResponse),
            Err(e) => Err(TransportError::Remote(e.to_string())),
        }
    }
}
