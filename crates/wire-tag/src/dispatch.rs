//! Protocol version selection.

use crate::codec::{EnvelopeCodec, IntTagCodec, OpcodeCodec, WireCodec};
use crate::error::{Error, Result};
use std::fmt;

/// A supported protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolVersion {
    /// In-band envelope.
    V1,
    /// Integer tag in metadata.
    V2,
    /// Opcode in metadata.
    V3,
}

impl ProtocolVersion {
    /// Numeric form of the version.
    #[must_use]
    pub const fn number(self) -> u32 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
            Self::V3 => 3,
        }
    }

    /// The codec implementing this version.
    #[must_use]
    pub fn codec(self) -> &'static dyn WireCodec {
        match self {
            Self::V1 => &EnvelopeCodec,
            Self::V2 => &IntTagCodec,
            Self::V3 => &OpcodeCodec,
        }
    }
}

impl TryFrom<u32> for ProtocolVersion {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            3 => Ok(Self::V3),
            other => Err(Error::UnsupportedVersion(other)),
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.number())
    }
}

/// Select the codec for a negotiated version number.
///
/// # Errors
///
/// Returns [`Error::UnsupportedVersion`] for anything outside 1..=3.
pub fn select_codec(version: u32) -> Result<&'static dyn WireCodec> {
    Ok(ProtocolVersion::try_from(version)?.codec())
}
