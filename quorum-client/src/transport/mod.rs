//! Transport abstraction and the TCP implementation.

mod correlator;
mod tcp;

pub use tcp::TcpTransport;

use async_trait::async_trait;
use bytes::Bytes;
use quorum_core::Result;

use crate::stream::StreamSink;

/// A single logical connection to a peer.
///
/// Requests and responses are opaque byte bodies at this layer; the
/// transport frames them, correlates responses back to callers, and
/// reports failures. Commands and queries differ only in the read-only
/// hint carried to the server.
///
/// Guarantees:
/// - Writes preserve submission order on the wire.
/// - Writes on a transport that is not connected fail immediately with
///   `NotConnected` and are never queued.
/// - `connect` and `close` are idempotent, and at most one of either is
///   in flight at a time.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establishes the connection. Idempotent once connected; fails with
    /// `NotConnected` after `close`.
    async fn connect(&self) -> Result<()>;

    /// Closes the connection, failing every in-flight request. Idempotent;
    /// a second call returns immediately.
    async fn close(&self) -> Result<()>;

    /// Sends a command and resolves with the response body.
    async fn command(&self, request: Bytes) -> Result<Bytes>;

    /// Sends a query and resolves with the response body.
    async fn query(&self, request: Bytes) -> Result<Bytes>;

    /// Sends a command expecting a streaming response. The sink receives
    /// each inbound frame; the returned future resolves when the stream
    /// terminates.
    async fn command_stream(&self, request: Bytes, sink: Box<dyn StreamSink<Bytes>>)
        -> Result<()>;

    /// Sends a query expecting a streaming response. Semantics match
    /// [`command_stream`](Transport::command_stream).
    async fn query_stream(&self, request: Bytes, sink: Box<dyn StreamSink<Bytes>>) -> Result<()>;
}
