//! Domain messages carried as tagged bodies, plus the factory that builds
//! them and the processor that interprets them.

use crate::codec::TaggedMessage;
use crate::error::{CodecError, Result};
use crate::registry::MessageType;
use bytes::Bytes;
use derive_more::From;
use prost::Message;
use tracing::info;

/// A status record.
#[derive(Clone, PartialEq, Message)]
pub struct Status {
    /// Free-form status document (JSON in practice).
    #[prost(string, tag = "1")]
    pub status: String,
}

/// One record inside a [`Container`].
#[derive(Clone, PartialEq, Message)]
pub struct Packet {
    /// Packet id.
    #[prost(int32, tag = "1")]
    pub id: i32,
    /// Packet name.
    #[prost(string, tag = "2")]
    pub name: String,
}

/// A named, tagged collection of packets.
#[derive(Clone, PartialEq, Message)]
pub struct Container {
    /// Collection tag.
    #[prost(string, tag = "1")]
    pub tag: String,
    /// Records.
    #[prost(message, repeated, tag = "2")]
    pub packets: Vec<Packet>,
}

/// A decoded domain message.
#[derive(Clone, Debug, From, PartialEq)]
pub enum DomainMessage {
    /// Status record.
    Status(Status),
    /// Packet container.
    Container(Container),
}

impl DomainMessage {
    /// The type tag this message travels under.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::Status(_) => MessageType::Status,
            Self::Container(_) => MessageType::Container,
        }
    }

    /// Serialize the body.
    #[must_use]
    pub fn encode_body(&self) -> Bytes {
        match self {
            Self::Status(status) => Bytes::from(status.encode_to_vec()),
            Self::Container(container) => Bytes::from(container.encode_to_vec()),
        }
    }

    /// Parse a body according to its type tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not a valid message of that type.
    pub fn decode_body(msg_type: MessageType, body: Bytes) -> Result<Self> {
        let message = match msg_type {
            MessageType::Status => Self::Status(Status::decode(body).map_err(CodecError::from)?),
            MessageType::Container => {
                Self::Container(Container::decode(body).map_err(CodecError::from)?)
            }
        };
        Ok(message)
    }
}

/// The status returned for a status request.
///
/// # Errors
///
/// Returns an error if the status document cannot be serialized.
pub fn ok_status() -> Result<Status> {
    let status = serde_json::to_string(&serde_json::json!({ "OK": "200" }))
        .map_err(CodecError::from)?;
    Ok(Status { status })
}

/// The container returned for a container request.
#[must_use]
pub fn sample_container() -> Container {
    Container {
        tag: "r-tag".to_string(),
        packets: vec![
            Packet {
                id: 999,
                name: "p999".to_string(),
            },
            Packet {
                id: 1000,
                name: "p1000".to_string(),
            },
        ],
    }
}

/// Builds domain bodies for outgoing requests and responses.
pub trait MessageFactory: Send + Sync + 'static {
    /// Body sent with a request of the given type. Requests carry no body
    /// unless overridden.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be built.
    fn request_body(&self, _msg_type: MessageType) -> Result<Bytes> {
        Ok(Bytes::new())
    }

    /// Body sent in reply to a request of the given type.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be built.
    fn response_body(&self, msg_type: MessageType) -> Result<Bytes>;
}

/// Interprets a decoded reply.
pub trait MessageProcessor: Send + Sync + 'static {
    /// What processing yields.
    type Output: Send;

    /// Consume one decoded reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be interpreted.
    fn process(&self, message: TaggedMessage) -> Result<Self::Output>;
}

/// Canned status/container responses with logging on receipt.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoMessages;

impl MessageFactory for DemoMessages {
    fn response_body(&self, msg_type: MessageType) -> Result<Bytes> {
        let message: DomainMessage = match msg_type {
            MessageType::Status => ok_status()?.into(),
            MessageType::Container => sample_container().into(),
        };
        Ok(message.encode_body())
    }
}

impl MessageProcessor for DemoMessages {
    type Output = DomainMessage;

    fn process(&self, message: TaggedMessage) -> Result<DomainMessage> {
        let decoded = DomainMessage::decode_body(message.msg_type, message.body)?;
        log_message(&decoded);
        Ok(decoded)
    }
}

fn log_message(message: &DomainMessage) {
    match message {
        DomainMessage::Status(status) => info!("status message: {}", status.status),
        DomainMessage::Container(container) => {
            info!("tag message: {}", container.tag);
            info!("msg contains {} packets", container.packets.len());
            for packet in &container.packets {
                info!(id = packet.id, name = %packet.name, "packet");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_status_document() {
        assert_eq!(ok_status().unwrap().status, r#"{"OK":"200"}"#);
    }

    #[test]
    fn test_response_bodies_match_their_type() {
        for msg_type in MessageType::ALL {
            let body = DemoMessages.response_body(msg_type).unwrap();
            let decoded = DomainMessage::decode_body(msg_type, body).unwrap();
            assert_eq!(decoded.message_type(), msg_type);
        }
    }

    #[test]
    fn test_process_container() {
        let body = DomainMessage::from(sample_container()).encode_body();
        let processed = DemoMessages
            .process(TaggedMessage::new(MessageType::Container, body))
            .unwrap();

        let DomainMessage::Container(container) = processed else {
            panic!("expected container, got {processed:?}");
        };
        assert_eq!(container.tag, "r-tag");
        assert_eq!(container.packets.len(), 2);
        assert_eq!(container.packets[1].name, "p1000");
    }

    #[test]
    fn test_invalid_body_is_codec_error() {
        let result = DemoMessages.process(TaggedMessage::new(
            MessageType::Status,
            Bytes::from_static(&[0x0a, 0x7f]),
        ));
        assert!(matches!(result, Err(crate::Error::Codec(_))));
    }

    #[test]
    fn test_default_request_body_is_empty() {
        assert!(DemoMessages.request_body(MessageType::Status).unwrap().is_empty());
    }
}
