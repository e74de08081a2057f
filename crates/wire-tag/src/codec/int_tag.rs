//! Version 2: integer type id in metadata, written in the byte order opposite
//! to the host's native order.

use super::{TaggedMessage, WireCodec};
use crate::dispatch::ProtocolVersion;
use crate::error::ProtocolError;
use crate::payload::Payload;
use crate::registry::MessageType;

/// Width of the type tag in bytes.
pub const TAG_WIDTH: usize = std::mem::size_of::<u32>();

/// Encode a type id in reversed host byte order.
#[must_use]
pub const fn tag_to_wire(id: u32) -> [u8; TAG_WIDTH] {
    id.swap_bytes().to_ne_bytes()
}

/// Decode a type id written by [`tag_to_wire`].
#[must_use]
pub const fn tag_from_wire(bytes: [u8; TAG_WIDTH]) -> u32 {
    u32::from_ne_bytes(bytes).swap_bytes()
}

/// Integer-tag codec. `data` carries the raw body.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntTagCodec;

impl WireCodec for IntTagCodec {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::V2
    }

    fn encode(&self, message: TaggedMessage) -> Payload {
        Payload::new(message.body, tag_to_wire(message.msg_type.id()).to_vec())
    }

    fn decode(&self, payload: &Payload) -> Result<TaggedMessage, ProtocolError> {
        let metadata = payload.metadata();
        if metadata.is_empty() {
            return Err(ProtocolError::Absent);
        }

        let tag = <[u8; TAG_WIDTH]>::try_from(metadata.as_ref()).map_err(|_| {
            ProtocolError::MalformedMessage(format!(
                "expected {TAG_WIDTH}-byte type tag, got {} bytes",
                metadata.len()
            ))
        })?;
        let msg_type = MessageType::from_id(tag_from_wire(tag))?;

        Ok(TaggedMessage::new(msg_type, payload.data().clone()))
    }
}
