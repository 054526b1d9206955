//! Push frame dispatch
//!
//! Decodes one inbound frame into a typed push event and routes it into the
//! conversation log. Malformed frames are logged and dropped; they never
//! crash the connection and never become conversation entries.

use std::sync::Arc;

use bz_core::ConversationEntry;
use bz_protocol::PushEvent;

use crate::log::ConversationLog;

/// Routes decoded push events into the conversation log
#[derive(Clone)]
pub struct MessageDispatcher {
    log: Arc<ConversationLog>,
}

impl MessageDispatcher {
    /// Create a dispatcher appending into `log`
    pub fn new(log: Arc<ConversationLog>) -> Self {
        Self { log }
    }

    /// Handle one raw inbound frame
    pub fn dispatch(&self, text: &str) {
        match PushEvent::decode(text) {
            Ok(Some(PushEvent::ToolNotice { content })) => {
                tracing::debug!("Tool notice from server");
                self.log.append(ConversationEntry::tool(content));
            }
            Ok(Some(PushEvent::ServerError { message })) => {
                tracing::debug!("Server-pushed error");
                self.log.append(ConversationEntry::error(message));
            }
            Ok(None) => {
                tracing::debug!("Ignoring push frame of unrecognized type");
            }
            Err(e) => {
                tracing::warn!("Dropping malformed push frame: {}", e);
            }
        }
    }
}
