//! Correlation of in-flight requests against a shared connection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use bytes::Bytes;
use quorum_core::envelope;
use quorum_core::error::{EnvelopeLayer, QuorumError, Result};
use quorum_core::protocol::WireMessage;
use tokio::sync::oneshot;

use crate::stream::StreamSink;

/// A registered in-flight request.
pub(crate) enum Pending {
    /// A unary request completed by a single response.
    Unary(oneshot::Sender<Result<Bytes>>),
    /// An open stream delivering frames until a terminal notification.
    Stream(StreamEntry),
}

/// The correlator's record of an open stream.
pub(crate) struct StreamEntry {
    sink: Box<dyn StreamSink<Bytes>>,
    done: Option<oneshot::Sender<()>>,
}

impl StreamEntry {
    fn new(sink: Box<dyn StreamSink<Bytes>>, done: oneshot::Sender<()>) -> Self {
        Self {
            sink,
            done: Some(done),
        }
    }

    fn complete(mut self) {
        self.sink.complete();
        self.finish();
    }

    fn error(mut self, error: QuorumError) {
        self.sink.error(error);
        self.finish();
    }

    fn finish(&mut self) {
        if let Some(done) = self.done.take() {
            let _ = done.send(());
        }
    }
}

struct Table {
    pending: HashMap<u64, Pending>,
    /// Set once the transport has failed; `register` rejects from then on.
    disconnected: Option<QuorumError>,
}

/// Maps outbound correlation ids to pending completions and stream sinks.
///
/// One correlator exists per transport instance. Correlation ids are unique
/// for the connection's lifetime; the table does not survive a rebuild of
/// the transport. Frames are delivered in transport arrival order because
/// the connection's single reader task is the only caller of [`deliver`].
///
/// [`deliver`]: Correlator::deliver
pub(crate) struct Correlator {
    table: Mutex<Table>,
    next_id: AtomicU64,
}

impl Correlator {
    pub(crate) fn new() -> Self {
        Self {
            table: Mutex::new(Table {
                pending: HashMap::new(),
                disconnected: None,
            }),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocates the next correlation id.
    pub(crate) fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Registers a unary completion under the given id.
    ///
    /// Registration happens before the request is handed to the transport,
    /// so a response can never race its own bookkeeping.
    pub(crate) fn register_unary(&self, id: u64) -> Result<oneshot::Receiver<Result<Bytes>>> {
        let (tx, rx) = oneshot::channel();
        self.insert(id, Pending::Unary(tx))?;
        Ok(rx)
    }

    /// Registers a stream sink under the given id.
    ///
    /// The returned receiver fires once the stream has terminated, after
    /// the sink's terminal notification.
    pub(crate) fn register_stream(
        &self,
        id: u64,
        sink: Box<dyn StreamSink<Bytes>>,
    ) -> Result<oneshot::Receiver<()>> {
        let (tx, rx) = oneshot::channel();
        self.insert(id, Pending::Stream(StreamEntry::new(sink, tx)))?;
        Ok(rx)
    }

    fn insert(&self, id: u64, entry: Pending) -> Result<()> {
        let mut table = self.table.lock().expect("correlator lock poisoned");
        if let Some(cause) = &table.disconnected {
            return Err(cause.clone());
        }
        if table.pending.contains_key(&id) {
            debug_assert!(false, "duplicate correlation id {id}");
            return Err(QuorumError::transport(format!(
                "duplicate correlation id {id}"
            )));
        }
        table.pending.insert(id, entry);
        Ok(())
    }

    /// Delivers an inbound frame to its pending entry.
    ///
    /// Unknown ids are silently dropped: the server may legitimately send
    /// late responses after client-side cancellation.
    pub(crate) fn deliver(&self, message: WireMessage) {
        let id = message.correlation_id;
        let entry = {
            let mut table = self.table.lock().expect("correlator lock poisoned");
            table.pending.remove(&id)
        };

        let Some(entry) = entry else {
            tracing::trace!(id, "dropping response for unknown correlation id");
            return;
        };

        // Sinks run user code; they are invoked outside the table lock.
        match entry {
            Pending::Unary(tx) => {
                let _ = tx.send(Self::unary_result(message));
            }
            Pending::Stream(mut entry) => {
                if message.is_error() {
                    entry.error(envelope::decode_error_detail(&message.body));
                } else if message.is_complete() {
                    entry.complete();
                } else {
                    entry.sink.next(message.body);
                    self.reinsert(id, entry);
                }
            }
        }
    }

    /// Puts a still-open stream back, unless the transport failed while the
    /// frame was being delivered.
    fn reinsert(&self, id: u64, entry: StreamEntry) {
        let cause = {
            let mut table = self.table.lock().expect("correlator lock poisoned");
            match &table.disconnected {
                None => {
                    table.pending.insert(id, Pending::Stream(entry));
                    return;
                }
                Some(cause) => cause.clone(),
            }
        };
        entry.error(cause);
    }

    fn unary_result(message: WireMessage) -> Result<Bytes> {
        if message.is_error() {
            Err(envelope::decode_error_detail(&message.body))
        } else if message.is_stream() || message.is_complete() {
            Err(QuorumError::malformed(
                EnvelopeLayer::Wire,
                "stream frame delivered to unary request",
            ))
        } else {
            Ok(message.body)
        }
    }

    /// Fails the entry registered under `id`, if any.
    ///
    /// Used when the transport accepted the registration but failed to
    /// write the request.
    pub(crate) fn fail(&self, id: u64, error: QuorumError) {
        let entry = {
            let mut table = self.table.lock().expect("correlator lock poisoned");
            table.pending.remove(&id)
        };
        match entry {
            Some(Pending::Unary(tx)) => {
                let _ = tx.send(Err(error));
            }
            Some(Pending::Stream(entry)) => entry.error(error),
            None => {}
        }
    }

    /// Removes the entry registered under `id` without notifying it.
    ///
    /// Cancellation support: late responses for the id are silently
    /// dropped from then on.
    pub(crate) fn remove(&self, id: u64) {
        let mut table = self.table.lock().expect("correlator lock poisoned");
        table.pending.remove(&id);
    }

    /// Drains every pending entry with a transport failure and transitions
    /// the correlator to the disconnected state, where `register` rejects.
    ///
    /// Idempotent: only the first call drains; later calls are no-ops.
    pub(crate) fn fail_all(&self, cause: QuorumError) {
        let drained: Vec<Pending> = {
            let mut table = self.table.lock().expect("correlator lock poisoned");
            if table.disconnected.is_some() {
                return;
            }
            table.disconnected = Some(cause.clone());
            table.pending.drain().map(|(_, entry)| entry).collect()
        };

        if !drained.is_empty() {
            tracing::debug!(count = drained.len(), "failing all in-flight requests");
        }

        for entry in drained {
            match entry {
                Pending::Unary(tx) => {
                    let _ = tx.send(Err(cause.clone()));
                }
                Pending::Stream(entry) => entry.error(cause.clone()),
            }
        }
    }

    /// Returns the number of in-flight entries.
    #[cfg(test)]
    pub(crate) fn pending_count(&self) -> usize {
        self.table
            .lock()
            .expect("correlator lock poisoned")
            .pending
            .len()
    }
}
