//! Transport-level framing for the quorum wire protocol.
//!
//! This module covers only the outermost layer: length-delimited frames
//! carrying a correlation id, role flags, and an opaque body. The nested
//! service envelopes inside the body live in [`crate::envelope`].

mod codec;
pub mod constants;
mod message;

pub use codec::WireMessageCodec;
pub use constants::*;
pub use message::WireMessage;
