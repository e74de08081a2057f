//! Version 3: single opcode byte in metadata.

use super::{TaggedMessage, WireCodec};
use crate::dispatch::ProtocolVersion;
use crate::error::ProtocolError;
use crate::payload::Payload;
use crate::registry::MessageType;

/// Opcode codec. One byte of metadata, no byte-order concerns, routable
/// without touching `data`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpcodeCodec;

impl WireCodec for OpcodeCodec {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::V3
    }

    fn encode(&self, message: TaggedMessage) -> Payload {
        Payload::new(message.body, vec![message.msg_type.opcode()])
    }

    fn decode(&self, payload: &Payload) -> Result<TaggedMessage, ProtocolError> {
        let msg_type = match payload.metadata().as_ref() {
            [] => return Err(ProtocolError::Absent),
            [opcode] => MessageType::from_opcode(*opcode)?,
            other => {
                return Err(ProtocolError::MalformedMessage(format!(
                    "expected 1-byte opcode, got {} bytes",
                    other.len()
                )));
            }
        };

        Ok(TaggedMessage::new(msg_type, payload.data().clone()))
    }
}
