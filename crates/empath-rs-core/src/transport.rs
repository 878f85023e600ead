//! Chat transport port.

use crate::error::TransportError;
use async_trait::async_trait;

/// Platform identifier of a chat.
pub type ChatId = i64;

/// Reference to a message the relay sent and may edit later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHandle {
    pub chat_id: ChatId,
    pub message_id: i64,
}

/// Result of editing a previously sent message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The message now shows the new text.
    Applied,
    /// The new text equals the current text; nothing changed.
    NotModified,
    /// Any other failure, with the platform's reason.
    Failed(String),
}

/// Outbound side of the chat platform.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a new text message to `chat_id`.
    async fn send_text(&self, chat_id: ChatId, text: &str)
    -> Result<MessageHandle, TransportError>;

    /// Replace the text of a message previously sent by the relay.
    async fn edit_text(&self, handle: MessageHandle, text: &str) -> EditOutcome;
}
