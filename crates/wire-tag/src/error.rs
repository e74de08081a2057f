//! Error types for the wire-tag protocol.

use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for wire-tag operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for an exchange.
#[derive(Debug, Error)]
pub enum Error {
    /// Protocol version outside the supported set.
    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(u32),

    /// Tag-level errors raised while decoding a payload.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Errors building or interpreting a domain message body.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Errors from the underlying transport.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// No reply arrived in time.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

/// The raw tag that failed to resolve to a message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownTag {
    /// Integer id (envelope and integer-tag formats).
    Id(u32),
    /// Single-byte opcode.
    Opcode(u8),
}

impl fmt::Display for UnknownTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Opcode(opcode) => write!(f, "opcode {opcode:#04x}"),
        }
    }
}

/// Errors raised while reading the type tag of a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Tag is present but not registered.
    #[error("Unknown message type: {0}")]
    UnknownType(UnknownTag),

    /// No tag present at all.
    #[error("No message type present")]
    Absent,

    /// Envelope or tag could not be parsed.
    #[error("Malformed message: {0}")]
    MalformedMessage(String),
}

impl ProtocolError {
    /// Whether the payload carried no usable message type.
    ///
    /// Responders treat both cases the same way when deciding whether to
    /// answer.
    #[must_use]
    pub const fn is_unresolved_type(&self) -> bool {
        matches!(self, Self::UnknownType(_) | Self::Absent)
    }
}

/// Domain body errors.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Serialization failed.
    #[error("Failed to serialize: {0}")]
    SerializationFailed(String),

    /// Deserialization failed.
    #[error("Failed to deserialize: {0}")]
    DeserializationFailed(String),
}

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Connecting took too long.
    #[error("Connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// Invalid frame received.
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Frame too large.
    #[error("Frame size {size} exceeds maximum {max}")]
    FrameTooLarge {
        /// Size of the frame.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Checksum mismatch.
    #[error("Checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Expected checksum.
        expected: u32,
        /// Actual checksum.
        actual: u32,
    },

    /// The peer failed the request and reported why.
    #[error("Remote error: {0}")]
    Remote(String),

    /// The peer chose not to answer.
    #[error("Peer sent no response")]
    NoResponse,

    /// Connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Channel closed unexpectedly.
    #[error("Channel closed")]
    ChannelClosed,
}

impl From<prost::DecodeError> for CodecError {
    fn from(err: prost::DecodeError) -> Self {
        Self::DeserializationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationFailed(err.to_string())
    }
}
