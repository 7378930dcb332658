//! Context store trait: ordered per-conversation message logs.
//!
//! Backends only store and hand back message lists. Truncation and
//! summarization policy live in the agent crate on top of this trait.

use async_trait::async_trait;

use crate::error::ContextError;
use crate::message::{ConversationId, Message};

/// Storage for conversation histories.
///
/// `set` replaces a history wholesale; `add` appends one message.
/// Implementations must preserve insertion order.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Read the ordered history. Unknown conversations are empty.
    async fn get(&self, id: &ConversationId) -> Result<Vec<Message>, ContextError>;

    /// Replace the history.
    async fn set(&self, id: &ConversationId, messages: Vec<Message>) -> Result<(), ContextError>;

    /// Append one message.
    async fn add(&self, id: &ConversationId, message: Message) -> Result<(), ContextError>;

    /// Forget a conversation.
    async fn clear(&self, id: &ConversationId) -> Result<(), ContextError>;

    async fn exists(&self, id: &ConversationId) -> Result<bool, ContextError>;

    /// Identifier of this backend (e.g., "in_memory").
    fn name(&self) -> &str;
}
