//! The service client: typed operations over a shared transport.

use std::sync::Arc;

use quorum_core::envelope::{self, RequestContext, ResponseContext, ServiceId, StreamContext};
use quorum_core::operation::{OperationId, OperationKind};
use quorum_core::payload::{PayloadDecoder, PayloadEncoder};
use quorum_core::{QuorumError, Result};

use super::sink::DecodingSink;
use crate::stream::StreamSink;
use crate::transport::Transport;

/// Selects the transport path for an operation.
///
/// Commands and queries reach the server with different consistency
/// guarantees, so an unknown kind is rejected here, before any envelope is
/// built or any byte is written.
fn route(operation: &OperationId) -> Result<OperationKind> {
    operation
        .kind()
        .ok_or(QuorumError::UnsupportedOperation {
            kind: operation.raw_kind(),
        })
}

/// A client for one service instance.
///
/// The client turns typed operations into nested envelopes, submits them
/// over the shared transport, and decodes responses back into typed
/// results together with their server-side ordering context. Payloads are
/// opaque: the caller supplies the encoder and decoder for each call.
///
/// Lifecycle: `construct → create → {execute*} → delete → discard`. The
/// client never retries; `create` on an existing service surfaces the
/// server's answer verbatim and handling it is the owner's policy.
pub struct ServiceClient {
    id: ServiceId,
    transport: Arc<dyn Transport>,
}

impl ServiceClient {
    /// Creates a client for the given service over the given transport.
    pub fn new(id: ServiceId, transport: Arc<dyn Transport>) -> Self {
        Self { id, transport }
    }

    /// Returns the service instance name.
    pub fn name(&self) -> &str {
        &self.id.name
    }

    /// Returns the service's primitive type.
    pub fn kind(&self) -> &str {
        &self.id.kind
    }

    /// Materializes the service instance on the server.
    pub async fn create(&self) -> Result<()> {
        tracing::debug!(name = %self.id.name, kind = %self.id.kind, "creating service");
        let request = envelope::encode_create_request(&self.id);
        let response = self.transport.command(request).await?;
        envelope::decode_service_response(&response)?;
        Ok(())
    }

    /// Removes the service instance from the server.
    pub async fn delete(&self) -> Result<()> {
        tracing::debug!(name = %self.id.name, kind = %self.id.kind, "deleting service");
        let request = envelope::encode_delete_request(&self.id);
        let response = self.transport.command(request).await?;
        envelope::decode_service_response(&response)?;
        Ok(())
    }

    /// Executes a unary operation.
    ///
    /// The request context is threaded into the envelope verbatim; the
    /// returned [`ResponseContext`] is the one the server emitted.
    pub async fn execute<T, U, E, D>(
        &self,
        operation: &OperationId,
        context: RequestContext,
        request: &T,
        encoder: E,
        decoder: D,
    ) -> Result<(ResponseContext, U)>
    where
        E: PayloadEncoder<T>,
        D: PayloadDecoder<U>,
    {
        let kind = route(operation)?;
        let payload = encoder.encode(request);

        match kind {
            OperationKind::Command => {
                let body =
                    envelope::encode_command_request(&self.id, operation.id(), context, payload);
                let response = self.transport.command(body).await?;
                let command = envelope::decode_command_response(&response)?;
                let output = decoder.decode(command.output)?;
                Ok((command.context.unwrap_or_default(), output))
            }
            OperationKind::Query => {
                let body =
                    envelope::encode_query_request(&self.id, operation.id(), context, payload);
                let response = self.transport.query(body).await?;
                let query = envelope::decode_query_response(&response)?;
                let output = decoder.decode(query.output)?;
                Ok((query.context.unwrap_or_default(), output))
            }
        }
    }

    /// Executes a streaming operation.
    ///
    /// Each server frame is decoded and delivered to the caller's sink as
    /// `(StreamContext, U)`; the future resolves when the stream
    /// terminates. Failures after the stream is established are surfaced
    /// on the sink, not the returned future.
    pub async fn execute_stream<T, U, E, D>(
        &self,
        operation: &OperationId,
        context: RequestContext,
        request: &T,
        encoder: E,
        sink: Box<dyn StreamSink<(StreamContext, U)>>,
        decoder: D,
    ) -> Result<()>
    where
        E: PayloadEncoder<T>,
        D: PayloadDecoder<U> + Send + 'static,
        U: Send + 'static,
    {
        let kind = route(operation)?;
        let payload = encoder.encode(request);
        let decoding = Box::new(DecodingSink::new(kind, sink, decoder));

        match kind {
            OperationKind::Command => {
                let body =
                    envelope::encode_command_request(&self.id, operation.id(), context, payload);
                self.transport.command_stream(body, decoding).await
            }
            OperationKind::Query => {
                let body =
                    envelope::encode_query_request(&self.id, operation.id(), context, payload);
                self.transport.query_stream(body, decoding).await
            }
        }
    }
}
