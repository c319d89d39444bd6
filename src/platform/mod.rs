pub mod telegram;

use async_trait::async_trait;

use crate::error::AnnotateError;

/// A message received from any platform
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct IncomingMessage {
    /// Platform identifier (e.g., "telegram")
    pub platform: String,
    /// Platform-specific author ID as string
    pub user_id: String,
    /// Platform-specific chat/channel ID as string
    pub chat_id: String,
    /// Thread the message belongs to: the message it replies to, or itself
    pub parent_id: String,
    /// Display name of the user
    pub user_name: String,
    /// The message text
    pub text: String,
}

/// A reply ready to be posted back into the originating thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyDraft {
    pub author_id: String,
    pub message: String,
    pub parent_id: String,
    pub chat_id: String,
}

/// Posts replies through a messaging transport.
#[async_trait]
pub trait ReplyPublisher: Send + Sync {
    async fn publish(&self, draft: ReplyDraft) -> Result<(), AnnotateError>;
}
