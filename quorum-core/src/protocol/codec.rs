//! Codec implementation for encoding/decoding framed wire messages.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use super::message::WireMessage;
use crate::error::{QuorumError, Result};

/// Codec for encoding and decoding quorum wire messages.
///
/// Implements the `tokio_util::codec::{Encoder, Decoder}` traits for use
/// with tokio's framed I/O. The codec is stateless; partial frames stay in
/// the read buffer until the remainder arrives.
#[derive(Debug, Default)]
pub struct WireMessageCodec;

impl WireMessageCodec {
    /// Creates a new codec instance.
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<WireMessage> for WireMessageCodec {
    type Error = QuorumError;

    fn encode(&mut self, item: WireMessage, dst: &mut BytesMut) -> Result<()> {
        item.write_to(dst);
        Ok(())
    }
}

impl Decoder for WireMessageCodec {
    type Item = WireMessage;
    type Error = QuorumError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        WireMessage::read_from(src)
    }
}
