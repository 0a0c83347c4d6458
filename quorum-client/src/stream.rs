//! Push-style receivers for streaming responses.

use quorum_core::QuorumError;
use tokio::sync::mpsc;

/// A push-style receiver for streaming responses.
///
/// A sink observes zero or more `next` calls in transport arrival order,
/// followed by exactly one terminal notification: `complete` on normal
/// termination or `error` on failure. No method is invoked after the
/// terminal notification.
pub trait StreamSink<T>: Send {
    /// Delivers the next stream element.
    fn next(&mut self, item: T);

    /// Signals normal termination of the stream.
    fn complete(&mut self);

    /// Signals abnormal termination of the stream.
    fn error(&mut self, error: QuorumError);
}

/// One observed stream notification.
#[derive(Debug)]
pub enum StreamEvent<T> {
    /// A stream element.
    Next(T),
    /// Normal termination.
    Complete,
    /// Abnormal termination.
    Error(QuorumError),
}

/// A [`StreamSink`] that forwards every notification into an unbounded
/// channel, turning the push-style stream into a pollable receiver.
#[derive(Debug)]
pub struct ChannelSink<T> {
    sender: mpsc::UnboundedSender<StreamEvent<T>>,
}

impl<T> ChannelSink<T> {
    /// Creates a sink and the receiver observing its notifications.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StreamEvent<T>>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl<T: Send> StreamSink<T> for ChannelSink<T> {
    fn next(&mut self, item: T) {
        // A dropped receiver means the caller stopped listening.
        let _ = self.sender.send(StreamEvent::Next(item));
    }

    fn complete(&mut self) {
        let _ = self.sender.send(StreamEvent::Complete);
    }

    fn error(&mut self, error: QuorumError) {
        let _ = self.sender.send(StreamEvent::Error(error));
    }
}
