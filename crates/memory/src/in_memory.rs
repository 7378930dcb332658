//! In-memory context store: the default for CLI sessions and tests.

use aifoundation_core::error::ContextError;
use aifoundation_core::memory::ContextStore;
use aifoundation_core::message::{ConversationId, Message};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::trace;

/// Per-conversation message logs held in a map.
///
/// Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct InMemoryContextStore {
    conversations: Arc<RwLock<HashMap<ConversationId, Vec<Message>>>>,
}

impl InMemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of conversations currently held.
    pub async fn conversation_count(&self) -> usize {
        self.conversations.read().await.len()
    }
}

#[async_trait]
impl ContextStore for InMemoryContextStore {
    async fn get(&self, id: &ConversationId) -> Result<Vec<Message>, ContextError> {
        Ok(self
            .conversations
            .read()
            .await
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set(&self, id: &ConversationId, messages: Vec<Message>) -> Result<(), ContextError> {
        trace!(conversation = %id, count = messages.len(), "Replacing history");
        self.conversations.write().await.insert(id.clone(), messages);
        Ok(())
    }

    async fn add(&self, id: &ConversationId, message: Message) -> Result<(), ContextError> {
        self.conversations
            .write()
            .await
            .entry(id.clone())
            .or_default()
            .push(message);
        Ok(())
    }

    async fn clear(&self, id: &ConversationId) -> Result<(), ContextError> {
        self.conversations.write().await.remove(id);
        Ok(())
    }

    async fn exists(&self, id: &ConversationId) -> Result<bool, ContextError> {
        Ok(self.conversations.read().await.contains_key(id))
    }

    fn name(&self) -> &str {
        "in_memory"
    }
}
