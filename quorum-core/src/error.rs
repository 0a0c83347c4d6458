//! Error types for quorum client operations.

use std::fmt;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Envelope layers, used to report where response decoding failed.
///
/// A response travels through three nested envelopes before the caller's
/// own decoder runs on the operation output. Errors carry the layer so a
/// malformed frame can be traced to the exact stage that rejected it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeLayer {
    /// The transport-level frame carrying correlation id and flags.
    Wire,
    /// The outer `ServiceResponse` envelope.
    ServiceResponse,
    /// The inner `CommandResponse` envelope.
    CommandResponse,
    /// The inner `QueryResponse` envelope.
    QueryResponse,
    /// A `StreamResponse` frame within an open stream.
    StreamResponse,
    /// The server-tagged error payload.
    ErrorDetail,
}

impl fmt::Display for EnvelopeLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wire => write!(f, "wire frame"),
            Self::ServiceResponse => write!(f, "service response"),
            Self::CommandResponse => write!(f, "command response"),
            Self::QueryResponse => write!(f, "query response"),
            Self::StreamResponse => write!(f, "stream response"),
            Self::ErrorDetail => write!(f, "error detail"),
        }
    }
}

/// The main error type for quorum client operations.
///
/// Errors are surfaced on the awaitable or sink belonging to the
/// originating caller and are never recovered internally. The enum is
/// `Clone` because a single transport failure is handed to every request
/// that was in flight when the connection died.
#[derive(Debug, Error, Clone)]
pub enum QuorumError {
    /// The transport is absent or closed. Raised synchronously at the
    /// call boundary, never wrapped in another variant.
    #[error("not connected")]
    NotConnected,

    /// An I/O-level failure while writing to or reading from the peer.
    #[error("transport failure: {message}")]
    Transport {
        /// Description of the underlying failure.
        message: String,
    },

    /// Decoding failed at an envelope layer, or the response discriminator
    /// did not match the request kind.
    #[error("malformed response at {layer}: {message}")]
    MalformedResponse {
        /// The envelope layer that rejected the bytes.
        layer: EnvelopeLayer,
        /// Description of the decode failure.
        message: String,
    },

    /// The operation kind is outside {COMMAND, QUERY}.
    #[error("unsupported operation kind {kind}")]
    UnsupportedOperation {
        /// The raw kind value that was rejected.
        kind: i32,
    },

    /// The caller cancelled the operation, or a blocking façade timeout
    /// elapsed before the server replied.
    #[error("operation cancelled")]
    Cancelled,

    /// A server-side error, propagated verbatim from a tagged response.
    #[error("application error ({code}): {message}")]
    Application {
        /// The server's error code.
        code: i32,
        /// The server's error message.
        message: String,
    },

    /// Client configuration errors (invalid settings).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// I/O errors from the standard library (wrapped in `Arc` for `Clone`).
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),
}

impl From<io::Error> for QuorumError {
    fn from(err: io::Error) -> Self {
        QuorumError::Io(Arc::new(err))
    }
}

impl QuorumError {
    /// Creates a `Transport` error with the given cause description.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a `MalformedResponse` error for the given layer.
    pub fn malformed(layer: EnvelopeLayer, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            layer,
            message: message.into(),
        }
    }

    /// Returns `true` if this error indicates the connection is unusable.
    ///
    /// A disconnected client must rebuild its transport before retrying;
    /// other errors leave the connection intact.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::Transport { .. } | Self::Io(_)
        )
    }
}

/// A specialized `Result` type for quorum operations.
pub type Result<T> = std::result::Result<T, QuorumError>;
