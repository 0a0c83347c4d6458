//! Encoder/decoder seams for opaque operation payloads.
//!
//! The pipeline never interprets operation payloads or outputs; callers
//! supply an encoder for the request and a decoder for the response.
//! Blanket implementations let plain closures serve as either, so a call
//! site can pass `|req: &PutRequest| ...` without a wrapper type.

use bytes::Bytes;

use crate::error::Result;

/// Encodes a typed request into opaque payload bytes.
pub trait PayloadEncoder<T> {
    /// Encodes the value. Encoding is infallible given well-typed input.
    fn encode(&self, value: &T) -> Bytes;
}

impl<T, F> PayloadEncoder<T> for F
where
    F: Fn(&T) -> Bytes,
{
    fn encode(&self, value: &T) -> Bytes {
        self(value)
    }
}

/// Decodes opaque output bytes into a typed response.
pub trait PayloadDecoder<U> {
    /// Decodes the bytes, surfacing the caller's own error on failure.
    fn decode(&self, bytes: Bytes) -> Result<U>;
}

impl<U, F> PayloadDecoder<U> for F
where
    F: Fn(Bytes) -> Result<U>,
{
    fn decode(&self, bytes: Bytes) -> Result<U> {
        self(bytes)
    }
}
