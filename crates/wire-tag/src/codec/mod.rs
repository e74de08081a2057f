//! Wire codecs for the three tagging formats.
//!
//! Every protocol version places the message type somewhere different:
//! - [`EnvelopeCodec`] (v1) wraps type and body in one envelope in `data`
//! - [`IntTagCodec`] (v2) writes a 4-byte id into `metadata`, byte-order reversed
//! - [`OpcodeCodec`] (v3) writes a single opcode byte into `metadata`
//!
//! Requests and responses share one layout within a version, so the
//! request/response methods on [`WireCodec`] default to [`WireCodec::encode`]
//! and [`WireCodec::decode`].

pub mod envelope;
pub mod int_tag;
pub mod opcode;

pub use envelope::{Envelope, EnvelopeCodec};
pub use int_tag::IntTagCodec;
pub use opcode::OpcodeCodec;

use crate::dispatch::ProtocolVersion;
use crate::error::ProtocolError;
use crate::payload::Payload;
use crate::registry::MessageType;
use bytes::Bytes;

/// A message type paired with its raw domain body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedMessage {
    /// Kind of message.
    pub msg_type: MessageType,
    /// Serialized domain body.
    pub body: Bytes,
}

impl TaggedMessage {
    /// Pair a type with a body.
    pub fn new(msg_type: MessageType, body: impl Into<Bytes>) -> Self {
        Self {
            msg_type,
            body: body.into(),
        }
    }
}

/// Encode/decode strategy for one protocol version.
///
/// Implementations are pure: no I/O, no suspension.
pub trait WireCodec: Send + Sync + 'static {
    /// The version this codec implements.
    fn version(&self) -> ProtocolVersion;

    /// Place the message into a transport payload.
    fn encode(&self, message: TaggedMessage) -> Payload;

    /// Recover the message from a transport payload.
    ///
    /// # Errors
    ///
    /// Fails with [`ProtocolError::Absent`], [`ProtocolError::UnknownType`] or
    /// [`ProtocolError::MalformedMessage`]; never returns a partial message.
    fn decode(&self, payload: &Payload) -> Result<TaggedMessage, ProtocolError>;

    /// Encode an outgoing request.
    fn encode_request(&self, message: TaggedMessage) -> Payload {
        self.encode(message)
    }

    /// Decode an incoming request.
    ///
    /// # Errors
    ///
    /// See [`WireCodec::decode`].
    fn decode_request(&self, payload: &Payload) -> Result<TaggedMessage, ProtocolError> {
        self.decode(payload)
    }

    /// Encode an outgoing response.
    fn encode_response(&self, message: TaggedMessage) -> Payload {
        self.encode(message)
    }

    /// Decode an incoming response.
    ///
    /// # Errors
    ///
    /// See [`WireCodec::decode`].
    fn decode_response(&self, payload: &Payload) -> Result<TaggedMessage, ProtocolError> {
        self.decode(payload)
    }
}
