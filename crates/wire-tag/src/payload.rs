//! The two-channel unit handed to and returned by a transport.

use bytes::Bytes;

/// A request or reply as seen by the transport.
///
/// `data` and `metadata` are independent byte channels. Once built a payload
/// is only read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    data: Bytes,
    metadata: Bytes,
}

impl Payload {
    /// Create a payload from both channels.
    pub fn new(data: impl Into<Bytes>, metadata: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            metadata: metadata.into(),
        }
    }

    /// Create a payload with empty metadata.
    pub fn from_data(data: impl Into<Bytes>) -> Self {
        Self::new(data, Bytes::new())
    }

    /// The body channel.
    #[must_use]
    pub const fn data(&self) -> &Bytes {
        &self.data
    }

    /// The metadata channel.
    #[must_use]
    pub const fn metadata(&self) -> &Bytes {
        &self.metadata
    }

    /// Split into `(data, metadata)`.
    #[must_use]
    pub fn into_parts(self) -> (Bytes, Bytes) {
        (self.data, self.metadata)
    }
}
