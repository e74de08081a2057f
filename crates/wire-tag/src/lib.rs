//! Versioned message-type tagging for single request/response exchanges.
//!
//! A request or reply is a [`Payload`] with two byte channels, `data` and
//! `metadata`. This crate decides where the [`MessageType`] of a message
//! lives in that payload. Three incompatible protocol versions are supported:
//!
//! | Version | `data` | `metadata` |
//! |---|---|---|
//! | 1 | protobuf envelope (type + body) | empty |
//! | 2 | raw body | 4-byte type id, reversed host byte order |
//! | 3 | raw body | 1-byte opcode |
//!
//! # Example
//!
//! ```no_run
//! use proven_wire_tag::{
//!     EngineConfig, MemoryTransport, MessageType, ProtocolVersion, Requester, Responder,
//! };
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default().with_version(ProtocolVersion::V3);
//!     let transport = MemoryTransport::new(Responder::new(&config));
//!     let requester = Requester::new(transport, config);
//!
//!     let reply = requester.exchange(MessageType::Container).await?;
//!     println!("{reply:?}");
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod messages;
pub mod payload;
pub mod registry;
pub mod transport;

pub use codec::{TaggedMessage, WireCodec};
pub use dispatch::{ProtocolVersion, select_codec};
pub use engine::{EngineConfig, Requester, Responder, UnknownTypePolicy};
pub use error::{CodecError, Error, ProtocolError, Result, TransportError, UnknownTag};
pub use messages::{DemoMessages, DomainMessage, MessageFactory, MessageProcessor};
pub use payload::Payload;
pub use registry::MessageType;
pub use transport::{
    ClientConfig, MemoryTransport, RequestHandler, ServerConfig, TcpClient, TcpServer, Transport,
};

// Re-export dependencies that are part of our public API
pub use bytes::Bytes;
pub use tokio_util::sync::CancellationToken;
