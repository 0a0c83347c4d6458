//! Core wire types and protocols for the quorum replicated-service client.
//!
//! This crate holds everything a peer needs to speak the quorum protocol:
//! the error taxonomy, the transport-level framing ([`protocol`]), the
//! nested service envelopes ([`envelope`]), operation identifiers
//! ([`operation`]), and the opaque-payload encoder/decoder seams
//! ([`payload`]). The client pipeline itself lives in `quorum-client`.

#![warn(missing_docs)]

pub mod envelope;
pub mod error;
pub mod operation;
pub mod payload;
pub mod protocol;

pub use envelope::{RequestContext, ResponseContext, ServiceId, StreamContext};
pub use error::{EnvelopeLayer, QuorumError, Result};
pub use operation::{OperationId, OperationKind};
pub use payload::{PayloadDecoder, PayloadEncoder};
