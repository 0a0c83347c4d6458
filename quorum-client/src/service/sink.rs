//! Stream sink that decodes envelope frames into typed elements.

use bytes::Bytes;
use quorum_core::envelope::{self, StreamContext};
use quorum_core::operation::OperationKind;
use quorum_core::payload::PayloadDecoder;
use quorum_core::{QuorumError, Result};

use crate::stream::StreamSink;

/// Adapts a caller's typed sink to the transport's byte-frame sink.
///
/// Each inbound frame is unwrapped as `ServiceResponse` → `StreamResponse`
/// (validating the oneof arm against the request kind) and the output is
/// run through the caller's decoder. A decode failure is terminal for the
/// caller's sink: it observes `error` once and nothing afterwards, even if
/// the transport keeps delivering frames for the id.
pub(crate) struct DecodingSink<U, D> {
    kind: OperationKind,
    inner: Box<dyn StreamSink<(StreamContext, U)>>,
    decoder: D,
    terminated: bool,
}

impl<U, D> DecodingSink<U, D> {
    pub(crate) fn new(
        kind: OperationKind,
        inner: Box<dyn StreamSink<(StreamContext, U)>>,
        decoder: D,
    ) -> Self {
        Self {
            kind,
            inner,
            decoder,
            terminated: false,
        }
    }
}

impl<U, D> DecodingSink<U, D>
where
    D: PayloadDecoder<U>,
{
    fn decode(&self, frame: &Bytes) -> Result<(StreamContext, U)> {
        let response = match self.kind {
            OperationKind::Command => envelope::decode_command_stream_frame(frame)?,
            OperationKind::Query => envelope::decode_query_stream_frame(frame)?,
        };
        let output = self.decoder.decode(response.output)?;
        Ok((response.context.unwrap_or_default(), output))
    }
}

impl<U, D> StreamSink<Bytes> for DecodingSink<U, D>
where
    U: Send,
    D: PayloadDecoder<U> + Send,
{
    fn next(&mut self, frame: Bytes) {
        if self.terminated {
            return;
        }
        match self.decode(&frame) {
            Ok(element) => self.inner.next(element),
            Err(error) => {
                self.terminated = true;
                self.inner.error(error);
            }
        }
    }

    fn complete(&mut self) {
        if !self.terminated {
            self.terminated = true;
            self.inner.complete();
        }
    }

    fn error(&mut self, error: QuorumError) {
        if !self.terminated {
            self.terminated = true;
            self.inner.error(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{ChannelSink, StreamEvent};

    fn u8_decoder(bytes: Bytes) -> Result<u8> {
        bytes.first().copied().ok_or_else(|| {
            QuorumError::malformed(quorum_core::EnvelopeLayer::Wire, "empty output")
        })
    }

    fn frame(value: u8, sequence: u64) -> Bytes {
        envelope::encode_command_stream_frame(
            StreamContext { index: 1, sequence },
            Bytes::copy_from_slice(&[value]),
        )
    }

    #[test]
    fn test_decodes_frames_in_order() {
        let (typed, mut events) = ChannelSink::new();
        let mut sink = DecodingSink::new(
            OperationKind::Command,
            Box::new(typed),
            u8_decoder as fn(Bytes) -> Result<u8>,
        );

        sink.next(frame(0x10, 0));
        sink.next(frame(0x11, 1));
        sink.complete();

        assert!(matches!(
            events.try_recv(),
            Ok(StreamEvent::Next((ctx, 0x10))) if ctx.sequence == 0
        ));
        assert!(matches!(
            events.try_recv(),
            Ok(StreamEvent::Next((ctx, 0x11))) if ctx.sequence == 1
        ));
        assert!(matches!(events.try_recv(), Ok(StreamEvent::Complete)));
    }

    #[test]
    fn test_wrong_arm_is_terminal_error() {
        let (typed, mut events) = ChannelSink::new();
        // Query sink receiving command-arm frames.
        let mut sink = DecodingSink::new(
            OperationKind::Query,
            Box::new(typed),
            u8_decoder as fn(Bytes) -> Result<u8>,
        );

        sink.next(frame(0x10, 0));
        sink.next(frame(0x11, 1));
        sink.complete();

        assert!(matches!(
            events.try_recv(),
            Ok(StreamEvent::Error(QuorumError::MalformedResponse { .. }))
        ));
        // Nothing after the terminal notification.
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_transport_error_passes_through_once() {
        let (typed, mut events) = ChannelSink::<(StreamContext, u8)>::new();
        let mut sink = DecodingSink::new(
            OperationKind::Command,
            Box::new(typed),
            u8_decoder as fn(Bytes) -> Result<u8>,
        );

        sink.error(QuorumError::transport("lost"));
        sink.error(QuorumError::transport("lost again"));
        sink.complete();

        assert!(matches!(
            events.try_recv(),
            Ok(StreamEvent::Error(QuorumError::Transport { .. }))
        ));
        assert!(events.try_recv().is_err());
    }
}
