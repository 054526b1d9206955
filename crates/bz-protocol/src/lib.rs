//! bz-protocol: Wire types for the Bazaar assistant client
//!
//! This crate defines the payloads exchanged with the assistant backend over
//! its two channels: the persistent push channel (JSON text frames) and the
//! request/response exchanges (upload, query, reset, health).

pub mod error;
pub mod exchange;
pub mod push;

pub use error::DecodeError;
pub use exchange::{HealthResponse, QueryRequest, QueryResponse, ResetResponse, UploadResponse};
pub use push::PushEvent;
