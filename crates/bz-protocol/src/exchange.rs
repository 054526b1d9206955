//! Request/response exchange payloads
//!
//! These mirror the backend's REST surface:
//!
//! - `POST /upload_image` (multipart, part `image`) -> [`UploadResponse`]
//! - `POST /agent` with [`QueryRequest`] -> [`QueryResponse`]
//! - `POST /reset_conversation` -> [`ResetResponse`]
//! - `GET /health` -> [`HealthResponse`]
//!
//! The `image_result` field of [`QueryResponse`] is double-encoded: the
//! outer response is JSON, and the field itself is a JSON-encoded list of
//! image reference strings.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Request body for the query exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// User text; may be empty when an image carries the query
    pub prompt: String,
    /// Opaque server reference from a prior upload, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Response body for the query exchange
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Textual reply from the assistant
    pub text_result: Option<String>,
    /// JSON-encoded ordered list of image reference strings
    pub image_result: Option<String>,
    /// Backend status marker, e.g. "success"
    #[serde(default)]
    pub status: Option<String>,
}

impl QueryResponse {
    /// Decode the double-encoded `image_result` field.
    ///
    /// An absent field is an empty list. A present-but-malformed field is a
    /// `DecodeError`; per the orchestration contract this only suppresses
    /// the image list, never the whole response.
    pub fn image_refs(&self) -> Result<Vec<String>, DecodeError> {
        match &self.image_result {
            Some(encoded) => serde_json::from_str(encoded).map_err(DecodeError::InvalidImageList),
            None => Ok(Vec::new()),
        }
    }
}

/// Response body for the upload exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Opaque server-side reference for the stored image
    pub image_path: String,
}

/// Response body for the reset exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response body for the health exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub agent_status: Option<String>,
}
