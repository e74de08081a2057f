use super::EngineConfig;
use crate::codec::{TaggedMessage, WireCodec};
use crate::error::{Error, Result};
use crate::messages::{DemoMessages, MessageFactory, MessageProcessor};
use crate::registry::MessageType;
use crate::transport::Transport;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Requester side of the engine.
pub struct Requester<T, F = DemoMessages, P = DemoMessages> {
    transport: T,
    codec: &'static dyn WireCodec,
    config: EngineConfig,
    factory: F,
    processor: P,
}

impl<T: Transport> Requester<T> {
    /// Create a requester using the demo message set.
    pub fn new(transport: T, config: EngineConfig) -> Self {
        Self::with_collaborators(transport, config, DemoMessages, DemoMessages)
    }
}

impl<T, F, P> Requester<T, F, P>
where
    T: Transport,
    F: MessageFactory,
    P: MessageProcessor,
{
    /// Create a requester with a custom request factory and reply processor.
    pub fn with_collaborators(
        transport: T,
        config: EngineConfig,
        factory: F,
        processor: P,
    ) -> Self {
        Self {
            transport,
            codec: config.version.codec(),
            config,
            factory,
            processor,
        }
    }

    /// The codec in use.
    #[must_use]
    pub fn codec(&self) -> &'static dyn WireCodec {
        self.codec
    }

    /// Run one exchange: encode, send, await the reply, decode, process.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails, the reply does not arrive in
    /// time, or the reply cannot be decoded or processed.
    #[instrument(skip(self), err, fields(version = %self.config.version))]
    pub async fn exchange(&self, msg_type: MessageType) -> Result<P::Output> {
        let body = self.factory.request_body(msg_type)?;
        let request = self.codec.encode_request(TaggedMessage::new(msg_type, body));

        debug!("Sending {} request", msg_type);

        let reply = timeout(
            self.config.reply_timeout,
            self.transport.request_response(request),
        )
        .await
        .map_err(|_| Error::Timeout(self.config.reply_timeout))??;

        let message = self.codec.decode_response(&reply)?;
        info!("receive response msg with type: {}", message.msg_type);

        self.processor.process(message)
    }

    /// Run one exchange unless `cancel` fires first.
    ///
    /// Returns `Ok(None)` when the exchange was abandoned; in that case no
    /// reply was processed.
    ///
    /// # Errors
    ///
    /// See [`Requester::exchange`].
    pub async fn exchange_until_cancelled(
        &self,
        msg_type: MessageType,
        cancel: &CancellationToken,
    ) -> Result<Option<P::Output>> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("Exchange for {} abandoned", msg_type);
                Ok(None)
            }
            result = self.exchange(msg_type) => result.map(Some),
        }
    }
}
