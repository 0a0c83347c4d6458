//! Blocking façade over the async service client.
//!
//! A thin adapter for callers that cannot await: every method drives the
//! async operation on a runtime handle under the configured operation
//! timeout. An elapsed timeout surfaces as [`QuorumError::Cancelled`];
//! transport failures pass through unchanged.
//!
//! Methods must not be called from within an async context; doing so
//! panics, as `block_on` inside a runtime worker would deadlock it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use quorum_core::envelope::{RequestContext, ResponseContext};
use quorum_core::operation::OperationId;
use quorum_core::payload::{PayloadDecoder, PayloadEncoder};
use quorum_core::{QuorumError, Result};
use tokio::runtime::Handle;

use crate::service::ServiceClient;

/// A synchronous (blocking) view of a [`ServiceClient`].
pub struct SyncServiceClient {
    inner: Arc<ServiceClient>,
    handle: Handle,
    timeout: Duration,
}

impl SyncServiceClient {
    /// Wraps an async client, driving it on the given runtime handle with
    /// the given per-operation timeout.
    pub fn new(inner: Arc<ServiceClient>, handle: Handle, timeout: Duration) -> Self {
        Self {
            inner,
            handle,
            timeout,
        }
    }

    /// Returns the service instance name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Returns the service's primitive type.
    pub fn kind(&self) -> &str {
        self.inner.kind()
    }

    /// Blocking [`ServiceClient::create`].
    pub fn create(&self) -> Result<()> {
        self.run(self.inner.create())
    }

    /// Blocking [`ServiceClient::delete`].
    pub fn delete(&self) -> Result<()> {
        self.run(self.inner.delete())
    }

    /// Blocking [`ServiceClient::execute`].
    pub fn execute<T, U, E, D>(
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
        self.run(
            self.inner
                .execute(operation, context, request, encoder, decoder),
        )
    }

    fn run<F, T>(&self, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.handle.block_on(async {
            match tokio::time::timeout(self.timeout, future).await {
                Ok(result) => result,
                Err(_) => Err(QuorumError::Cancelled),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use quorum_core::envelope::ServiceId;

    use crate::stream::StreamSink;
    use crate::transport::Transport;

    /// A transport whose requests never complete.
    struct StalledTransport;

    #[async_trait]
    impl Transport for StalledTransport {
        async fn connect(&self) -> Result<()> {
            Ok(())
        }

        async fn close(&self) -> Result<()> {
            Ok(())
        }

        async fn command(&self, _request: Bytes) -> Result<Bytes> {
            std::future::pending().await
        }

        async fn query(&self, _request: Bytes) -> Result<Bytes> {
            std::future::pending().await
        }

        async fn command_stream(
            &self,
            _request: Bytes,
            _sink: Box<dyn StreamSink<Bytes>>,
        ) -> Result<()> {
            std::future::pending().await
        }

        async fn query_stream(
            &self,
            _request: Bytes,
            _sink: Box<dyn StreamSink<Bytes>>,
        ) -> Result<()> {
            std::future::pending().await
        }
    }

    /// A transport that echoes a canned unary response.
    struct CannedTransport {
        response: Bytes,
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn connect(&self) -> Result<()> {
            Ok(())
        }

        async fn close(&self) -> Result<()> {
            Ok(())
        }

        async fn command(&self, _request: Bytes) -> Result<Bytes> {
            Ok(self.response.clone())
        }

        async fn query(&self, _request: Bytes) -> Result<Bytes> {
            Ok(self.response.clone())
        }

        async fn command_stream(
            &self,
            _request: Bytes,
            mut sink: Box<dyn StreamSink<Bytes>>,
        ) -> Result<()> {
            sink.complete();
            Ok(())
        }

        async fn query_stream(
            &self,
            _request: Bytes,
            mut sink: Box<dyn StreamSink<Bytes>>,
        ) -> Result<()> {
            sink.complete();
            Ok(())
        }
    }

    fn sync_client(transport: Arc<dyn Transport>, timeout: Duration) -> (SyncServiceClient, tokio::runtime::Runtime) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_time()
            .build()
            .unwrap();
        let client = ServiceClient::new(ServiceId::new("orders", "map"), transport);
        let sync = SyncServiceClient::new(Arc::new(client), runtime.handle().clone(), timeout);
        (sync, runtime)
    }

    #[test]
    fn test_timeout_surfaces_as_cancelled() {
        let (sync, _runtime) = sync_client(Arc::new(StalledTransport), Duration::from_millis(50));

        let err = sync.create().unwrap_err();
        assert!(matches!(err, QuorumError::Cancelled));
    }

    #[test]
    fn test_create_completes_against_live_transport() {
        let response = quorum_core::envelope::encode_command_response(
            ResponseContext::default(),
            Bytes::new(),
        );
        let (sync, _runtime) = sync_client(
            Arc::new(CannedTransport { response }),
            Duration::from_secs(1),
        );

        sync.create().unwrap();
        assert_eq!(sync.name(), "orders");
        assert_eq!(sync.kind(), "map");
    }
}
