//! Wire types shared with the techfeed backend
//!
//! - `common`: envelopes and payload bodies as the backend serializes them
//! - `api`: per-endpoint request/response aliases

pub mod api;
pub mod common;
