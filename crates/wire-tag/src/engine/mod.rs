//! Request/response engine.
//!
//! [`Requester`] drives one exchange per call over a [`Transport`];
//! [`Responder`] answers requests as a [`RequestHandler`]. Both pick their
//! codec from the configured [`ProtocolVersion`].
//!
//! [`Transport`]: crate::transport::Transport
//! [`RequestHandler`]: crate::transport::RequestHandler

mod requester;
mod responder;

pub use requester::Requester;
pub use responder::Responder;

use crate::dispatch::ProtocolVersion;
use std::time::Duration;

/// What a responder does with a request whose type it cannot resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownTypePolicy {
    /// Fail the request with an explicit error.
    #[default]
    Reject,
    /// Leave the request unanswered, as legacy responders did.
    Ignore,
}

/// Configuration shared by requesters and responders.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Negotiated protocol version.
    pub version: ProtocolVersion,
    /// How long a requester waits for its reply.
    pub reply_timeout: Duration,
    /// Responder behaviour for unknown or absent type tags.
    pub unknown_type_policy: UnknownTypePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: ProtocolVersion::V1,
            reply_timeout: Duration::from_secs(30),
            unknown_type_policy: UnknownTypePolicy::Reject,
        }
    }
}

impl EngineConfig {
    /// Set the protocol version.
    #[must_use]
    pub const fn with_version(mut self, version: ProtocolVersion) -> Self {
        self.version = version;
        self
    }

    /// Set the reply timeout.
    #[must_use]
    pub const fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// Set the unknown-type policy.
    #[must_use]
    pub const fn with_unknown_type_policy(mut self, policy: UnknownTypePolicy) -> Self {
        self.unknown_type_policy = policy;
        self
    }
}
