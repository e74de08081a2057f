//! Version 1: type and body carried together in a self-describing envelope.

use super::{TaggedMessage, WireCodec};
use crate::dispatch::ProtocolVersion;
use crate::error::ProtocolError;
use crate::payload::Payload;
use crate::registry::MessageType;
use bytes::Bytes;
use prost::Message;

/// Protobuf envelope serialized into `Payload.data`.
#[derive(Clone, PartialEq, Message)]
pub struct Envelope {
    /// Message type id.
    #[prost(uint32, tag = "1")]
    pub r#type: u32,
    /// Domain body.
    #[prost(bytes = "bytes", tag = "2")]
    pub data: Bytes,
}

/// In-band codec. Metadata is left empty and ignored when decoding, so this
/// format survives transports that drop metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeCodec;

impl WireCodec for EnvelopeCodec {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::V1
    }

    fn encode(&self, message: TaggedMessage) -> Payload {
        let envelope = Envelope {
            r#type: message.msg_type.id(),
            data: message.body,
        };
        Payload::from_data(envelope.encode_to_vec())
    }

    fn decode(&self, payload: &Payload) -> Result<TaggedMessage, ProtocolError> {
        let envelope = Envelope::decode(payload.data().clone())
            .map_err(|e| ProtocolError::MalformedMessage(format!("invalid envelope: {e}")))?;
        let msg_type = MessageType::from_id(envelope.r#type)?;

        Ok(TaggedMessage::new(msg_type, envelope.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnknownTag;

    #[test]
    fn test_metadata_is_empty() {
        let payload = EnvelopeCodec.encode(TaggedMessage::new(MessageType::Container, "body"));
        assert!(payload.metadata().is_empty());
        assert!(!payload.data().is_empty());
    }

    #[test]
    fn test_wire_layout() {
        let payload = EnvelopeCodec.encode(TaggedMessage::new(MessageType::Container, "ab"));
        // field 1 varint = 2, field 2 length-delimited "ab"
        assert_eq!(payload.data().as_ref(), &[0x08, 0x02, 0x12, 0x02, b'a', b'b']);
    }

    #[test]
    fn test_metadata_ignored_on_decode() {
        let encoded = EnvelopeCodec.encode(TaggedMessage::new(MessageType::Status, "x"));
        let with_noise = Payload::new(encoded.data().clone(), vec![0xff, 0xff]);

        let decoded = EnvelopeCodec.decode(&with_noise).unwrap();
        assert_eq!(decoded.msg_type, MessageType::Status);
        assert_eq!(decoded.body, Bytes::from_static(b"x"));
    }

    #[test]
    fn test_unknown_type_in_envelope() {
        let envelope = Envelope {
            r#type: 42,
            data: Bytes::from_static(b"x"),
        };
        let payload = Payload::from_data(envelope.encode_to_vec());

        assert_eq!(
            EnvelopeCodec.decode(&payload),
            Err(ProtocolError::UnknownType(UnknownTag::Id(42)))
        );
    }

    #[test]
    fn test_malformed_envelope() {
        // length-delimited field claiming 16 bytes with only 2 present
        let payload = Payload::from_data(vec![0x12, 0x10, 0x01, 0x02]);

        assert!(matches!(
            EnvelopeCodec.decode(&payload),
            Err(ProtocolError::MalformedMessage(_))
        ));
    }
}
