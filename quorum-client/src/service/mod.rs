//! Service clients over a shared transport.

mod client;
mod sink;

pub use client::ServiceClient;
