//! TCP transport: one connection, a serialized write queue, and a reader
//! task that pushes inbound frames to the correlator.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use quorum_core::protocol::{WireMessage, WireMessageCodec, DEFAULT_FLAGS, QUERY_FLAG};
use quorum_core::{QuorumError, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::codec::{Decoder, Encoder};

use super::correlator::Correlator;
use super::Transport;
use crate::config::ClientConfig;
use crate::stream::StreamSink;

/// Connection lifecycle states.
///
/// `Closed` is terminal; a failed transport is rebuilt by constructing a
/// fresh `TcpTransport`, which also rebuilds the correlator.
enum ConnState {
    New,
    Connecting,
    Connected(Conn),
    Closing,
    Closed { cause: Option<String> },
}

impl ConnState {
    fn name(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Connecting => "connecting",
            Self::Connected(_) => "connected",
            Self::Closing => "closing",
            Self::Closed { .. } => "closed",
        }
    }
}

struct Conn {
    writer_tx: mpsc::Sender<WireMessage>,
    reader_task: JoinHandle<()>,
}

struct Shared {
    correlator: Correlator,
    state: Mutex<ConnState>,
}

impl Shared {
    /// Records a connection failure: drains the correlator and moves the
    /// state machine to `Closed` with the cause.
    async fn fail(&self, message: String) {
        self.correlator.fail_all(QuorumError::transport(&message));

        let mut state = self.state.lock().await;
        if !matches!(*state, ConnState::Closed { .. }) {
            tracing::debug!(cause = %message, "connection failed");
            if let ConnState::Connected(conn) = &*state {
                conn.reader_task.abort();
            }
            *state = ConnState::Closed {
                cause: Some(message),
            };
        }
    }
}

/// A [`Transport`] over a single TCP connection.
///
/// All writes funnel through one queue consumed by a writer task, so frame
/// boundaries never interleave and submission order is preserved on the
/// wire. A reader task decodes inbound frames and hands them to the
/// per-transport correlator without parsing their bodies.
pub struct TcpTransport {
    config: ClientConfig,
    shared: Arc<Shared>,
}

impl TcpTransport {
    /// Creates a transport for the configured peer. No connection is
    /// attempted until [`Transport::connect`].
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                correlator: Correlator::new(),
                state: Mutex::new(ConnState::New),
            }),
        }
    }

    /// Returns the current lifecycle state name, for diagnostics.
    pub async fn state_name(&self) -> &'static str {
        self.shared.state.lock().await.name()
    }

    /// Returns the write queue sender, or `NotConnected`.
    async fn writer(&self) -> Result<mpsc::Sender<WireMessage>> {
        let state = self.shared.state.lock().await;
        match &*state {
            ConnState::Connected(conn) => Ok(conn.writer_tx.clone()),
            _ => Err(QuorumError::NotConnected),
        }
    }

    /// Sends a unary request and awaits its correlated response.
    async fn invoke(&self, body: Bytes, flags: u16) -> Result<Bytes> {
        let writer = self.writer().await?;
        let correlator = &self.shared.correlator;

        let id = correlator.next_id();
        // Register before submitting so a response can never beat the
        // bookkeeping.
        let rx = correlator.register_unary(id)?;

        if writer.send(WireMessage::new(id, flags, body)).await.is_err() {
            correlator.remove(id);
            return Err(QuorumError::transport("write queue closed"));
        }

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(QuorumError::transport("pending request dropped")),
        }
    }

    /// Sends a stream-opening request and resolves once the stream has
    /// terminated. Failures after registration are surfaced on the sink.
    async fn invoke_stream(
        &self,
        body: Bytes,
        flags: u16,
        sink: Box<dyn StreamSink<Bytes>>,
    ) -> Result<()> {
        let writer = self.writer().await?;
        let correlator = &self.shared.correlator;

        let id = correlator.next_id();
        let done = correlator.register_stream(id, sink)?;

        if writer.send(WireMessage::new(id, flags, body)).await.is_err() {
            correlator.fail(id, QuorumError::transport("write queue closed"));
        }

        let _ = done.await;
        Ok(())
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&self) -> Result<()> {
        let mut state = self.shared.state.lock().await;
        match &*state {
            ConnState::Connected(_) => return Ok(()),
            ConnState::Closed { .. } => return Err(QuorumError::NotConnected),
            ConnState::New => {}
            // The state lock serializes connect/close; these are
            // unobservable here.
            ConnState::Connecting | ConnState::Closing => return Err(QuorumError::NotConnected),
        }

        *state = ConnState::Connecting;
        let address = self.config.address();

        let stream = match timeout(self.config.connect_timeout(), TcpStream::connect(address)).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                let message = format!("failed to connect to {}: {}", address, e);
                *state = ConnState::Closed {
                    cause: Some(message.clone()),
                };
                return Err(QuorumError::transport(message));
            }
            Err(_) => {
                let message = format!(
                    "connection to {} timed out after {:?}",
                    address,
                    self.config.connect_timeout()
                );
                *state = ConnState::Closed {
                    cause: Some(message.clone()),
                };
                return Err(QuorumError::transport(message));
            }
        };

        if let Err(e) = stream.set_nodelay(self.config.no_delay()) {
            let message = format!("failed to set TCP_NODELAY: {}", e);
            *state = ConnState::Closed {
                cause: Some(message.clone()),
            };
            return Err(QuorumError::transport(message));
        }

        let (read_half, write_half) = stream.into_split();
        let (writer_tx, writer_rx) = mpsc::channel(self.config.write_queue_depth());

        tokio::spawn(write_loop(writer_rx, write_half, Arc::clone(&self.shared)));
        let reader_task = tokio::spawn(read_loop(
            read_half,
            Arc::clone(&self.shared),
            self.config.read_buffer_capacity(),
        ));

        *state = ConnState::Connected(Conn {
            writer_tx,
            reader_task,
        });
        tracing::debug!(address = %address, "transport connected");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.shared.state.lock().await;
        match std::mem::replace(&mut *state, ConnState::Closing) {
            ConnState::Connected(conn) => {
                // Dropping the sender ends the writer task once its queue
                // drains; the reader is stopped directly.
                drop(conn.writer_tx);
                conn.reader_task.abort();
                self.shared
                    .correlator
                    .fail_all(QuorumError::transport("connection closed"));
                *state = ConnState::Closed { cause: None };
                tracing::debug!(address = %self.config.address(), "transport closed");
                Ok(())
            }
            previous @ ConnState::Closed { .. } => {
                *state = previous;
                Ok(())
            }
            _ => {
                *state = ConnState::Closed { cause: None };
                Ok(())
            }
        }
    }

    async fn command(&self, request: Bytes) -> Result<Bytes> {
        self.invoke(request, DEFAULT_FLAGS).await
    }

    async fn query(&self, request: Bytes) -> Result<Bytes> {
        self.invoke(request, QUERY_FLAG).await
    }

    async fn command_stream(
        &self,
        request: Bytes,
        sink: Box<dyn StreamSink<Bytes>>,
    ) -> Result<()> {
        self.invoke_stream(request, DEFAULT_FLAGS, sink).await
    }

    async fn query_stream(&self, request: Bytes, sink: Box<dyn StreamSink<Bytes>>) -> Result<()> {
        self.invoke_stream(request, QUERY_FLAG, sink).await
    }
}

/// Drains the write queue onto the socket, preserving submission order.
async fn write_loop(
    mut queue: mpsc::Receiver<WireMessage>,
    mut socket: OwnedWriteHalf,
    shared: Arc<Shared>,
) {
    let mut codec = WireMessageCodec::new();
    let mut buffer = BytesMut::new();

    while let Some(message) = queue.recv().await {
        buffer.clear();
        if codec.encode(message, &mut buffer).is_err() {
            continue;
        }
        if let Err(e) = socket.write_all(&buffer).await {
            shared.fail(format!("failed to write: {}", e)).await;
            return;
        }
    }

    let _ = socket.shutdown().await;
}

/// Reads framed messages off the socket and delivers them to the
/// correlator. Any read or framing error poisons the connection.
async fn read_loop(mut socket: OwnedReadHalf, shared: Arc<Shared>, buffer_capacity: usize) {
    let mut codec = WireMessageCodec::new();
    let mut buffer = BytesMut::with_capacity(buffer_capacity);

    loop {
        loop {
            match codec.decode(&mut buffer) {
                Ok(Some(message)) => shared.correlator.deliver(message),
                Ok(None) => break,
                Err(e) => {
                    shared.fail(format!("framing error: {}", e)).await;
                    return;
                }
            }
        }

        match socket.read_buf(&mut buffer).await {
            Ok(0) => {
                shared.fail("connection closed by peer".to_string()).await;
                return;
            }
            Ok(_) => {}
            Err(e) => {
                shared.fail(format!("failed to read: {}", e)).await;
                return;
            }
        }
    }
}
