//! Push channel frames
//!
//! Inbound frames on the push channel are UTF-8 text encoding a JSON object
//! with at least a `type` field. Currently recognized types are `tool`
//! (an intermediate assistant action) and `error` (a server-pushed failure
//! notice). Unrecognized types decode to `None` so newer servers can add
//! frame kinds without breaking older clients. No outbound frames exist.

use serde::Deserialize;

use crate::error::DecodeError;

/// Raw shape of an inbound push frame
#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    frame_type: String,
    /// Payload for `tool` frames
    content: Option<String>,
    /// Payload for `error` frames
    message: Option<String>,
    /// Server-side send time (seconds since epoch); informational only
    #[allow(dead_code)]
    timestamp: Option<f64>,
}

/// A decoded push event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    /// The assistant performed an intermediate action (e.g. a tool call)
    ToolNotice { content: String },
    /// The server pushed a failure notice
    ServerError { message: String },
}

impl PushEvent {
    /// Decode one inbound text frame.
    ///
    /// Returns `Ok(None)` for structurally valid frames of an unrecognized
    /// type. Malformed frames are a `DecodeError`; the caller is expected to
    /// log and drop them rather than propagate.
    pub fn decode(text: &str) -> Result<Option<Self>, DecodeError> {
        let raw: RawFrame = serde_json::from_str(text).map_err(DecodeError::InvalidFrame)?;

        match raw.frame_type.as_str() {
            "tool" => {
                let content = raw.content.ok_or(DecodeError::MissingField {
                    frame_type: raw.frame_type,
                    field: "content",
                })?;
                Ok(Some(PushEvent::ToolNotice { content }))
            }
            "error" => {
                let message = raw.message.ok_or(DecodeError::MissingField {
                    frame_type: raw.frame_type,
                    field: "message",
                })?;
                Ok(Some(PushEvent::ServerError { message }))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_tool_frame() {
        let event = PushEvent::decode(r#"{"type":"tool","content":"searching catalog","timestamp":1700000000.5}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            PushEvent::ToolNotice {
                content: "searching catalog".into()
            }
        );
    }

    #[test]
    fn test_decode_error_frame() {
        let event = PushEvent::decode(r#"{"type":"error","message":"agent unavailable"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            PushEvent::ServerError {
                message: "agent unavailable".into()
            }
        );
    }

    #[test]
    fn test_unknown_type_is_ignored() {
        let event = PushEvent::decode(r#"{"type":"heartbeat","content":"ping"}"#).unwrap();
        assert!(event.is_none());
    }

    #[test]
    fn test_malformed_frame_is_error() {
        assert!(PushEvent::decode("not json").is_err());
        assert!(PushEvent::decode(r#"{"content":"no type"}"#).is_err());
    }

    #[test]
    fn test_tool_frame_without_content_is_error() {
        let err = PushEvent::decode(r#"{"type":"tool"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MissingField { field: "content", .. }));
    }
}
