//! Async client pipeline for quorum replicated state-machine services.
//!
//! A quorum service is a server-side state machine identified by a
//! [`ServiceId`], exposing state-mutating **commands** (applied through the
//! consensus path) and read-only **queries**. This crate turns typed
//! operations into nested protocol envelopes, routes them over a shared
//! transport, demultiplexes responses by correlation id, and exposes both
//! unary and server-streaming result semantics.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use bytes::Bytes;
//! use quorum_client::{ClientConfig, ServiceClient, TcpTransport, Transport};
//! use quorum_core::{OperationId, RequestContext, ServiceId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder("10.0.0.1:5000".parse()?).build()?;
//!     let transport = Arc::new(TcpTransport::new(config));
//!     transport.connect().await?;
//!
//!     let client = ServiceClient::new(ServiceId::new("orders", "map"), transport);
//!     client.create().await?;
//!
//!     let put = OperationId::command("put");
//!     let (context, output) = client
//!         .execute(
//!             &put,
//!             RequestContext::default(),
//!             &Bytes::from_static(b"key=value"),
//!             |req: &Bytes| req.clone(),
//!             |bytes: Bytes| -> quorum_core::Result<Bytes> { Ok(bytes) },
//!         )
//!         .await?;
//!     println!("applied at index {}: {:?}", context.index, output);
//!
//!     client.delete().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Streaming
//!
//! Streaming operations deliver each server frame to a [`StreamSink`] as
//! `(StreamContext, U)` and resolve when the stream terminates. The
//! bundled [`ChannelSink`] adapts the push-style sink to a pollable
//! channel receiver.
//!
//! # Failure semantics
//!
//! No error is recovered inside the pipeline. Transport failures drain
//! every in-flight request with exactly one terminal notification each;
//! a malformed response fails only its own caller; callers attach their
//! own timeouts to the returned futures (or use [`SyncServiceClient`],
//! which applies the configured operation timeout uniformly).

#![warn(missing_docs)]

pub mod config;
pub mod service;
pub mod stream;
pub mod sync;
pub mod transport;

pub use config::{ClientConfig, ClientConfigBuilder, ConfigError};
pub use quorum_core as core;
pub use quorum_core::{QuorumError, Result};
pub use service::ServiceClient;
pub use stream::{ChannelSink, StreamEvent, StreamSink};
pub use sync::SyncServiceClient;
pub use transport::{TcpTransport, Transport};
