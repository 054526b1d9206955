//! Protocol decode errors

use thiserror::Error;

/// Errors that can occur while decoding inbound payloads
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Frame is not valid JSON or lacks the expected structure
    #[error("Invalid push frame: {0}")]
    InvalidFrame(#[source] serde_json::Error),

    /// Frame is structurally valid but missing its payload field
    #[error("Push frame of type '{frame_type}' is missing field '{field}'")]
    MissingField {
        frame_type: String,
        field: &'static str,
    },

    /// The `image_result` field did not decode as a list of references
    #[error("Invalid image result list: {0}")]
    InvalidImageList(#[source] serde_json::Error),
}
