//! Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// Kind of a conversation entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Something the user submitted
    User,
    /// A reply from the assistant
    Agent,
    /// An intermediate assistant action pushed over the side channel
    Tool,
    /// A failure surfaced to the user
    Error,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::User => write!(f, "user"),
            EntryKind::Agent => write!(f, "agent"),
            EntryKind::Tool => write!(f, "tool"),
            EntryKind::Error => write!(f, "error"),
        }
    }
}

/// One record in the conversation log.
///
/// Entries are immutable once appended; the log's iteration order is append
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub kind: EntryKind,
    pub content: String,
    pub created_at: SystemTime,
    /// Local preview reference for an attached image, if any
    pub attachment: Option<String>,
    /// Ordered image references returned with an assistant reply
    pub result_images: Vec<String>,
}

impl ConversationEntry {
    fn new(kind: EntryKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            created_at: SystemTime::now(),
            attachment: None,
            result_images: Vec::new(),
        }
    }

    /// Entry echoing a user submission
    pub fn user(content: impl Into<String>, attachment: Option<String>) -> Self {
        Self {
            attachment,
            ..Self::new(EntryKind::User, content)
        }
    }

    /// Entry carrying an assistant reply
    pub fn agent(content: impl Into<String>, result_images: Vec<String>) -> Self {
        Self {
            result_images,
            ..Self::new(EntryKind::Agent, content)
        }
    }

    /// Entry for an intermediate assistant action
    pub fn tool(content: impl Into<String>) -> Self {
        Self::new(EntryKind::Tool, content)
    }

    /// Entry surfacing a failure to the user
    pub fn error(content: impl Into<String>) -> Self {
        Self::new(EntryKind::Error, content)
    }
}

/// Lifecycle state of the push channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelState {
    /// No socket; nothing scheduled
    Disconnected,
    /// A connect attempt is underway
    Connecting,
    /// A live socket exists
    Connected,
    /// Caller-requested teardown in progress
    Closing,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Disconnected => write!(f, "disconnected"),
            ChannelState::Connecting => write!(f, "connecting"),
            ChannelState::Connected => write!(f, "connected"),
            ChannelState::Closing => write!(f, "closing"),
        }
    }
}

/// Named stateful operations guarded by the operation gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AttachImage,
    SubmitQuery,
    ResetSession,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::AttachImage => write!(f, "attach-image"),
            Operation::SubmitQuery => write!(f, "submit-query"),
            Operation::ResetSession => write!(f, "reset-session"),
        }
    }
}

/// Transient client-side state for an image attached to the next query.
///
/// `preview` and `server_ref` settle independently while the upload is
/// pending; the attachment counts as uploaded only once both are present.
/// It is cleared atomically on submit, on explicit removal, and on upload
/// failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachedImage {
    /// Local data for display (e.g. a path or data URL)
    pub preview: Option<String>,
    /// Opaque reference returned by the upload exchange
    pub server_ref: Option<String>,
}

impl AttachedImage {
    /// Whether the upload completed and the attachment is usable
    pub fn is_uploaded(&self) -> bool {
        self.preview.is_some() && self.server_ref.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_kind_display() {
        assert_eq!(format!("{}", EntryKind::User), "user");
        assert_eq!(format!("{}", EntryKind::Error), "error");
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(format!("{}", Operation::AttachImage), "attach-image");
        assert_eq!(format!("{}", Operation::SubmitQuery), "submit-query");
        assert_eq!(format!("{}", Operation::ResetSession), "reset-session");
    }

    #[test]
    fn test_attached_image_is_uploaded() {
        let mut img = AttachedImage::default();
        assert!(!img.is_uploaded());
        img.preview = Some("preview.png".into());
        assert!(!img.is_uploaded());
        img.server_ref = Some("/tmp/abc123".into());
        assert!(img.is_uploaded());
    }
}
