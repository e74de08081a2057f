use super::{EngineConfig, UnknownTypePolicy};
use crate::codec::{TaggedMessage, WireCodec};
use crate::error::Result;
use crate::messages::{DemoMessages, MessageFactory};
use crate::payload::Payload;
use crate::transport::RequestHandler;
use async_trait::async_trait;
use tracing::{info, warn};

/// Responder side of the engine.
pub struct Responder<F = DemoMessages> {
    codec: &'static dyn WireCodec,
    policy: UnknownTypePolicy,
    factory: F,
}

impl Responder {
    /// Create a responder answering with the demo message set.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_factory(config, DemoMessages)
    }
}

impl<F: MessageFactory> Responder<F> {
    /// Create a responder with a custom response factory.
    pub fn with_factory(config: &EngineConfig, factory: F) -> Self {
        Self {
            codec: config.version.codec(),
            policy: config.unknown_type_policy,
            factory,
        }
    }

    /// Decode a request and build its reply.
    ///
    /// Returns `Ok(None)` only under [`UnknownTypePolicy::Ignore`], for a
    /// request whose type is unknown or absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be decoded (subject to the
    /// policy above) or the response body cannot be built.
    pub fn respond(&self, request: &Payload) -> Result<Option<Payload>> {
        let message = match self.codec.decode_request(request) {
            Ok(message) => message,
            Err(e) if e.is_unresolved_type() && self.policy == UnknownTypePolicy::Ignore => {
                warn!("Ignoring request: {}", e);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            "receive request with version {} and msg with type {}",
            self.codec.version(),
            message.msg_type
        );

        let body = self.factory.response_body(message.msg_type)?;
        Ok(Some(
            self.codec
                .encode_response(TaggedMessage::new(message.msg_type, body)),
        ))
    }
}

#[async_trait]
impl<F: MessageFactory> RequestHandler for Responder<F> {
    async fn handle(&self, request: Payload) -> Result<Option<Payload>> {
        self.respond(&request)
    }
}
