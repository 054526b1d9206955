//! Exchange trait

use async_trait::async_trait;

use crate::error::ExchangeError;
use bz_protocol::{HealthResponse, QueryRequest, QueryResponse, ResetResponse, UploadResponse};

/// Abstraction over the request/response channel to the assistant backend.
///
/// The session orchestrator is written against this trait so tests can
/// drive it with scripted responses instead of a live server.
#[async_trait]
pub trait AgentExchange: Send + Sync {
    /// Upload an image, returning an opaque server reference
    async fn upload_image(
        &self,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<UploadResponse, ExchangeError>;

    /// Submit a query carrying text and an optional image reference
    async fn query(&self, request: QueryRequest) -> Result<QueryResponse, ExchangeError>;

    /// Ask the backend to reset its conversation state
    async fn reset(&self) -> Result<ResetResponse, ExchangeError>;

    /// Check backend health (display purposes only)
    async fn health(&self) -> Result<HealthResponse, ExchangeError>;
}
