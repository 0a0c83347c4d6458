//! Wire message type for the quorum transport framing.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::constants::*;
use crate::error::{EnvelopeLayer, QuorumError, Result};

/// A single framed message on the transport.
///
/// Each message consists of:
/// - A 4-byte length field (little-endian), counting everything after it
/// - An 8-byte correlation id (little-endian)
/// - A 2-byte flags field (little-endian)
/// - The body bytes
///
/// The body is opaque at this layer. For requests it holds an encoded
/// `ServiceRequest`; for responses an encoded `ServiceResponse`, a stream
/// frame, or a tagged error payload, as indicated by the flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    /// Correlation id matching a response back to its request.
    pub correlation_id: u64,
    /// Frame flags indicating the message role.
    pub flags: u16,
    /// The message body.
    pub body: Bytes,
}

impl WireMessage {
    /// Creates a new message with the given correlation id, flags, and body.
    pub fn new(correlation_id: u64, flags: u16, body: Bytes) -> Self {
        Self {
            correlation_id,
            flags,
            body,
        }
    }

    /// Creates a command request message.
    pub fn command(correlation_id: u64, body: Bytes) -> Self {
        Self::new(correlation_id, DEFAULT_FLAGS, body)
    }

    /// Creates a query request message.
    pub fn query(correlation_id: u64, body: Bytes) -> Self {
        Self::new(correlation_id, QUERY_FLAG, body)
    }

    /// Creates a unary response message.
    pub fn response(correlation_id: u64, body: Bytes) -> Self {
        Self::new(correlation_id, DEFAULT_FLAGS, body)
    }

    /// Creates a stream frame carrying one element of an open stream.
    pub fn stream_frame(correlation_id: u64, body: Bytes) -> Self {
        Self::new(correlation_id, STREAM_FLAG, body)
    }

    /// Creates a stream completion marker.
    pub fn stream_complete(correlation_id: u64) -> Self {
        Self::new(correlation_id, STREAM_FLAG | COMPLETE_FLAG, Bytes::new())
    }

    /// Creates a tagged error response.
    pub fn error(correlation_id: u64, body: Bytes) -> Self {
        Self::new(correlation_id, ERROR_FLAG, body)
    }

    /// Returns true if this message has the QUERY flag set.
    pub fn is_query(&self) -> bool {
        self.flags & QUERY_FLAG != 0
    }

    /// Returns true if this message has the STREAM flag set.
    pub fn is_stream(&self) -> bool {
        self.flags & STREAM_FLAG != 0
    }

    /// Returns true if this message has the COMPLETE flag set.
    pub fn is_complete(&self) -> bool {
        self.flags & COMPLETE_FLAG != 0
    }

    /// Returns true if this message has the ERROR flag set.
    pub fn is_error(&self) -> bool {
        self.flags & ERROR_FLAG != 0
    }

    /// Returns the frame length value (correlation id + flags + body).
    ///
    /// This is the value written in the length field.
    pub fn frame_length(&self) -> usize {
        FRAME_HEADER_SIZE + self.body.len()
    }

    /// Returns the size of this message on the wire, including the length field.
    pub fn wire_size(&self) -> usize {
        SIZE_OF_FRAME_LENGTH_FIELD + self.frame_length()
    }

    /// Writes this message to the given buffer.
    pub fn write_to(&self, dst: &mut BytesMut) {
        dst.reserve(self.wire_size());
        dst.put_u32_le(self.frame_length() as u32);
        dst.put_u64_le(self.correlation_id);
        dst.put_u16_le(self.flags);
        dst.put_slice(&self.body);
    }

    /// Reads a message from the given buffer.
    ///
    /// Returns `Ok(None)` if there isn't enough data for a complete frame,
    /// leaving the buffer untouched. A length field exceeding
    /// `MAX_FRAME_LENGTH` or shorter than the fixed header is rejected.
    pub fn read_from(src: &mut BytesMut) -> Result<Option<Self>> {
        if src.len() < SIZE_OF_FRAME_LENGTH_FIELD {
            return Ok(None);
        }

        let frame_length = u32::from_le_bytes([src[0], src[1], src[2], src[3]]) as usize;
        if frame_length < FRAME_HEADER_SIZE {
            return Err(QuorumError::malformed(
                EnvelopeLayer::Wire,
                format!("frame length {} shorter than header", frame_length),
            ));
        }
        if frame_length > MAX_FRAME_LENGTH {
            return Err(QuorumError::malformed(
                EnvelopeLayer::Wire,
                format!("frame length {} exceeds maximum", frame_length),
            ));
        }

        let total_frame_size = SIZE_OF_FRAME_LENGTH_FIELD + frame_length;
        if src.len() < total_frame_size {
            return Ok(None);
        }

        src.advance(SIZE_OF_FRAME_LENGTH_FIELD);
        let correlation_id = src.get_u64_le();
        let flags = src.get_u16_le();
        let body = src.split_to(frame_length - FRAME_HEADER_SIZE).freeze();

        Ok(Some(Self::new(correlation_id, flags, body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_message() {
        let body = Bytes::from_static(&[1, 2, 3]);
        let msg = WireMessage::new(7, QUERY_FLAG, body.clone());
        assert_eq!(msg.correlation_id, 7);
        assert_eq!(msg.flags, QUERY_FLAG);
        assert_eq!(msg.body, body);
    }

    #[test]
    fn test_message_flags() {
        let command = WireMessage::command(1, Bytes::new());
        assert!(!command.is_query());
        assert!(!command.is_stream());

        let query = WireMessage::query(2, Bytes::new());
        assert!(query.is_query());

        let frame = WireMessage::stream_frame(3, Bytes::new());
        assert!(frame.is_stream());
        assert!(!frame.is_complete());

        let complete = WireMessage::stream_complete(4);
        assert!(complete.is_stream());
        assert!(complete.is_complete());
        assert!(complete.body.is_empty());

        let error = WireMessage::error(5, Bytes::new());
        assert!(error.is_error());
    }

    #[test]
    fn test_frame_length() {
        let empty = WireMessage::command(1, Bytes::new());
        assert_eq!(empty.frame_length(), FRAME_HEADER_SIZE);

        let with_body = WireMessage::command(1, Bytes::from_static(&[1, 2, 3]));
        assert_eq!(with_body.frame_length(), FRAME_HEADER_SIZE + 3);
    }

    #[test]
    fn test_wire_size() {
        let msg = WireMessage::command(1, Bytes::from_static(&[1, 2, 3, 4, 5]));
        assert_eq!(msg.wire_size(), 4 + 8 + 2 + 5);
    }

    #[test]
    fn test_write_and_read_roundtrip() {
        let original = WireMessage::new(
            0xDEAD_BEEF,
            STREAM_FLAG,
            Bytes::from_static(&[0xDE, 0xAD, 0xBE, 0xEF]),
        );
        let mut buf = BytesMut::new();
        original.write_to(&mut buf);

        assert_eq!(buf.len(), original.wire_size());

        let decoded = WireMessage::read_from(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, original);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_read_incomplete_length() {
        let mut buf = BytesMut::from(&[0x01, 0x02][..]);
        assert!(WireMessage::read_from(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn test_read_incomplete_body() {
        let mut buf = BytesMut::new();
        buf.put_u32_le((FRAME_HEADER_SIZE + 4) as u32);
        buf.put_u64_le(1);
        buf.put_u16_le(0);
        buf.put_slice(&[0x01, 0x02]); // only 2 of 4 body bytes

        assert!(WireMessage::read_from(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_read_rejects_short_frame_length() {
        let mut buf = BytesMut::new();
        buf.put_u32_le((FRAME_HEADER_SIZE - 1) as u32);
        buf.put_slice(&[0; FRAME_HEADER_SIZE]);

        let err = WireMessage::read_from(&mut buf).unwrap_err();
        assert!(matches!(
            err,
            QuorumError::MalformedResponse {
                layer: EnvelopeLayer::Wire,
                ..
            }
        ));
    }

    #[test]
    fn test_read_rejects_oversized_frame_length() {
        let mut buf = BytesMut::new();
        buf.put_u32_le((MAX_FRAME_LENGTH + 1) as u32);
        buf.put_slice(&[0; 16]);

        assert!(WireMessage::read_from(&mut buf).is_err());
    }

    #[test]
    fn test_read_empty_body_frame() {
        let mut buf = BytesMut::new();
        WireMessage::stream_complete(9).write_to(&mut buf);

        let decoded = WireMessage::read_from(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.correlation_id, 9);
        assert!(decoded.is_complete());
        assert!(decoded.body.is_empty());
    }

    #[test]
    fn test_read_large_frame() {
        let body: Vec<u8> = (0..1000).map(|i| (i % 256) as u8).collect();
        let original = WireMessage::command(42, Bytes::from(body.clone()));

        let mut buf = BytesMut::new();
        original.write_to(&mut buf);

        let decoded = WireMessage::read_from(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.body.len(), 1000);
        assert_eq!(&decoded.body[..], &body[..]);
    }
}
