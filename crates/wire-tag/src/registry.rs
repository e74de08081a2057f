//! The closed set of message types and their wire identifiers.

use crate::error::{ProtocolError, UnknownTag};
use std::fmt;

/// Opcode carried for [`MessageType::Status`].
pub const STATUS_OPCODE: u8 = 0x07;

/// Opcode carried for [`MessageType::Container`].
pub const CONTAINER_OPCODE: u8 = 0x09;

/// Kind of message carried by a payload.
///
/// Ids and opcodes are fixed for the lifetime of the protocol and are never
/// reassigned. Adding a variant forces every exhaustive match below (and in
/// the codecs) to be updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageType {
    /// A status record.
    Status = 1,
    /// A tagged collection of packets.
    Container = 2,
}

impl MessageType {
    /// Every registered message type.
    pub const ALL: [Self; 2] = [Self::Status, Self::Container];

    /// Integer id used by the envelope and integer-tag formats.
    #[must_use]
    pub const fn id(self) -> u32 {
        self as u32
    }

    /// Single-byte opcode used by the opcode format.
    #[must_use]
    pub const fn opcode(self) -> u8 {
        match self {
            Self::Status => STATUS_OPCODE,
            Self::Container => CONTAINER_OPCODE,
        }
    }

    /// Human readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Container => "container",
        }
    }

    /// Resolve an integer id.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownType`] if no type has this id.
    pub const fn from_id(id: u32) -> Result<Self, ProtocolError> {
        match id {
            1 => Ok(Self::Status),
            2 => Ok(Self::Container),
            _ => Err(ProtocolError::UnknownType(UnknownTag::Id(id))),
        }
    }

    /// Resolve a single-byte opcode.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownType`] if no type has this opcode.
    pub const fn from_opcode(opcode: u8) -> Result<Self, ProtocolError> {
        match opcode {
            STATUS_OPCODE => Ok(Self::Status),
            CONTAINER_OPCODE => Ok(Self::Container),
            _ => Err(ProtocolError::UnknownType(UnknownTag::Opcode(opcode))),
        }
    }
}

impl TryFrom<u32> for MessageType {
    type Error = ProtocolError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        Self::from_id(id)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_and_opcodes_resolve_back() {
        for msg_type in MessageType::ALL {
            assert_eq!(MessageType::from_id(msg_type.id()), Ok(msg_type));
            assert_eq!(MessageType::from_opcode(msg_type.opcode()), Ok(msg_type));
        }
    }

    #[test]
    fn test_fixed_assignments() {
        assert_eq!(MessageType::Status.id(), 1);
        assert_eq!(MessageType::Container.id(), 2);
        assert_eq!(MessageType::Status.opcode(), 0x07);
        assert_eq!(MessageType::Container.opcode(), 0x09);
    }

    #[test]
    fn test_unknown_id() {
        assert_eq!(
            MessageType::from_id(0),
            Err(ProtocolError::UnknownType(UnknownTag::Id(0)))
        );
        assert_eq!(
            MessageType::try_from(3),
            Err(ProtocolError::UnknownType(UnknownTag::Id(3)))
        );
    }

    #[test]
    fn test_unknown_opcode() {
        for opcode in (0..=u8::MAX).filter(|b| *b != STATUS_OPCODE && *b != CONTAINER_OPCODE) {
            assert_eq!(
                MessageType::from_opcode(opcode),
                Err(ProtocolError::UnknownType(UnknownTag::Opcode(opcode)))
            );
        }
    }

    #[test]
    fn test_unknown_tag_display() {
        assert_eq!(UnknownTag::Opcode(0x0a).to_string(), "opcode 0x0a");
        assert_eq!(UnknownTag::Id(7).to_string(), "id 7");
    }
}
