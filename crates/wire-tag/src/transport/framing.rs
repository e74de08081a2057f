//! Message framing for the TCP transport.

use crate::error::TransportError;
use crate::payload::Payload;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Maximum frame size (10MB by default).
pub const MAX_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Frame header size (4 bytes length + 1 byte type + 4 bytes checksum).
pub const FRAME_HEADER_SIZE: usize = 9;

/// Size of the metadata length prefix inside request/response frames.
const METADATA_LEN_SIZE: usize = 4;

/// Type of frame being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    /// Request payload.
    Request = 0x01,
    /// Response payload.
    Response = 0x02,
    /// Request failed; UTF-8 reason.
    Error = 0x03,
    /// Request deliberately left unanswered.
    Empty = 0x04,
}

impl TryFrom<u8> for FrameType {
    type Error = TransportError;

    fn try_from(value: u8) -> Result<Self, TransportError> {
        match value {
            0x01 => Ok(Self::Request),
            0x02 => Ok(Self::Response),
            0x03 => Ok(Self::Error),
            0x04 => Ok(Self::Empty),
            _ => Err(TransportError::InvalidFrame(format!(
                "Unknown frame type: {value:#x}"
            ))),
        }
    }
}

/// A frame on the wire.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Type of this frame.
    pub frame_type: FrameType,
    /// Frame payload.
    pub payload: Bytes,
    /// Optional checksum for integrity.
    pub checksum: Option<u32>,
}

impl Frame {
    /// Create a new checksummed frame.
    pub fn new(frame_type: FrameType, payload: Bytes) -> Self {
        let checksum = Some(crc32fast::hash(&payload));
        Self {
            frame_type,
            payload,
            checksum,
        }
    }

    /// Frame carrying a request payload.
    #[must_use]
    pub fn request(payload: &Payload) -> Self {
        Self::new(FrameType::Request, encode_payload(payload))
    }

    /// Frame carrying a response payload.
    #[must_use]
    pub fn response(payload: &Payload) -> Self {
        Self::new(FrameType::Response, encode_payload(payload))
    }

    /// Frame reporting a failed request.
    #[must_use]
    pub fn error(reason: &str) -> Self {
        Self::new(FrameType::Error, Bytes::copy_from_slice(reason.as_bytes()))
    }

    /// Frame standing in for a reply that was not produced.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(FrameType::Empty, Bytes::new())
    }

    /// Verify the checksum if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the checksum is invalid.
    pub fn verify_checksum(&self) -> Result<(), TransportError> {
        if let Some(expected) = self.checksum {
            let actual = crc32fast::hash(&self.payload);
            if expected != actual {
                return Err(TransportError::ChecksumMismatch { expected, actual });
            }
        }
        Ok(())
    }

    /// Recover the transport payload of a request or response frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame body is truncated.
    pub fn into_payload(self) -> Result<Payload, TransportError> {
        decode_payload(self.payload)
    }
}

/// Lay out a payload as `metadata length | metadata | data`.
fn encode_payload(payload: &Payload) -> Bytes {
    let metadata = payload.metadata();
    let data = payload.data();
    let mut buf = BytesMut::with_capacity(METADATA_LEN_SIZE + metadata.len() + data.len());

    #[allow(clippy::cast_possible_truncation)]
    buf.put_u32(metadata.len() as u32);
    buf.put_slice(metadata);
    buf.put_slice(data);

    buf.freeze()
}

fn decode_payload(mut body: Bytes) -> Result<Payload, TransportError> {
    if body.len() < METADATA_LEN_SIZE {
        return Err(TransportError::InvalidFrame(format!(
            "payload frame of {} bytes has no metadata length",
            body.len()
        )));
    }

    let metadata_len = body.get_u32() as usize;
    if body.len() < metadata_len {
        return Err(TransportError::InvalidFrame(format!(
            "metadata length {metadata_len} exceeds remaining {} bytes",
            body.len()
        )));
    }

    let metadata = body.split_to(metadata_len);
    Ok(Payload::new(body, metadata))
}

/// Codec for encoding/decoding frames.
pub struct FrameCodec {
    max_frame_size: usize,
    verify_checksum: bool,
}

impl FrameCodec {
    /// Create a new frame codec.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
            verify_checksum: true,
        }
    }

    /// Create a codec with custom max frame size.
    #[must_use]
    pub const fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Disable checksum verification.
    #[must_use]
    pub const fn without_checksum_verification(mut self) -> Self {
        self.verify_checksum = false;
        self
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = TransportError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if buf.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        // Parse header without consuming
        let mut header = &buf[..FRAME_HEADER_SIZE];
        let payload_len = header.get_u32() as usize;
        let frame_type_byte = header.get_u8();
        let checksum = header.get_u32();

        if payload_len > self.max_frame_size {
            return Err(TransportError::FrameTooLarge {
                size: payload_len,
                max: self.max_frame_size,
            });
        }

        let frame_len = FRAME_HEADER_SIZE + payload_len;
        if buf.len() < frame_len {
            buf.reserve(frame_len - buf.len());
            return Ok(None);
        }

        let frame_type = FrameType::try_from(frame_type_byte)?;

        buf.advance(FRAME_HEADER_SIZE);
        let payload = buf.split_to(payload_len).freeze();

        let frame = Frame {
            frame_type,
            payload,
            checksum: if checksum != 0 { Some(checksum) } else { None },
        };

        if self.verify_checksum {
            frame.verify_checksum()?;
        }

        Ok(Some(frame))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = TransportError;

    fn encode(&mut self, frame: Frame, buf: &mut BytesMut) -> Result<(), Self::Error> {
        let payload_len = frame.payload.len();

        if payload_len > self.max_frame_size {
            return Err(TransportError::FrameTooLarge {
                size: payload_len,
                max: self.max_frame_size,
            });
        }

        buf.reserve(FRAME_HEADER_SIZE + payload_len);

        #[allow(clippy::cast_possible_truncation)]
        buf.put_u32(payload_len as u32);
        buf.put_u8(frame.frame_type as u8);
        buf.put_u32(frame.checksum.unwrap_or(0));
        buf.put(frame.payload);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_frame_roundtrip() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();

        let payload = Payload::new("body bytes", vec![0x09]);
        codec.encode(Frame::request(&payload), &mut buf).unwrap();

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.frame_type, FrameType::Request);
        assert_eq!(decoded.into_payload().unwrap(), payload);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_empty_channels_survive_framing() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();

        codec.encode(Frame::response(&Payload::default()), &mut buf).unwrap();

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        let payload = decoded.into_payload().unwrap();
        assert!(payload.data().is_empty());
        assert!(payload.metadata().is_empty());
    }

    #[test]
    fn test_partial_frame() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();

        buf.put_u32(100);
        buf.put_u8(FrameType::Request as u8);

        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_checksum_verification() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();

        let body = b"Hello, World!";
        #[allow(clippy::cast_possible_truncation)]
        buf.put_u32(body.len() as u32);
        buf.put_u8(FrameType::Error as u8);
        buf.put_u32(12345);
        buf.put_slice(body);

        assert!(matches!(
            codec.decode(&mut buf),
            Err(TransportError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_frame_too_large() {
        let mut codec = FrameCodec::new().with_max_frame_size(8);
        let mut buf = BytesMut::new();

        let result = codec.encode(Frame::error("this reason is too long"), &mut buf);
        assert!(matches!(result, Err(TransportError::FrameTooLarge { max: 8, .. })));
    }

    #[test]
    fn test_unknown_frame_type() {
        let mut codec = FrameCodec::new().without_checksum_verification();
        let mut buf = BytesMut::new();

        buf.put_u32(0);
        buf.put_u8(0x7f);
        buf.put_u32(0);

        assert!(matches!(
            codec.decode(&mut buf),
            Err(TransportError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_truncated_metadata() {
        let mut body = BytesMut::new();
        body.put_u32(10);
        body.put_slice(b"abc");

        let frame = Frame::new(FrameType::Response, body.freeze());
        assert!(matches!(
            frame.into_payload(),
            Err(TransportError::InvalidFrame(_))
        ));
    }
}
