//! Conversation context policy on top of a [`ContextStore`].
//!
//! The store only keeps ordered message lists. The manager decides how
//! long they may grow, how to fit them into a token budget, and how to
//! condense them.

use super::token::TokenCounter;
use aifoundation_config::ContextConfig;
use aifoundation_core::error::ContextError;
use aifoundation_core::memory::ContextStore;
use aifoundation_core::message::{ConversationId, Message, Role};
use aifoundation_core::provider::{Provider, ProviderRequest};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Snapshot statistics for one conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextInfo {
    pub conversation_id: ConversationId,
    pub message_count: usize,
    pub token_count: usize,
    /// At or beyond either the message or the token limit.
    pub is_truncated: bool,
    pub oldest_message: Option<DateTime<Utc>>,
    pub latest_message: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct ContextManager {
    store: Arc<dyn ContextStore>,
    config: ContextConfig,
    counter: TokenCounter,
}

impl ContextManager {
    pub fn new(store: Arc<dyn ContextStore>, config: ContextConfig) -> Self {
        Self {
            store,
            config,
            counter: TokenCounter::new(),
        }
    }

    pub fn with_token_counter(mut self, counter: TokenCounter) -> Self {
        self.counter = counter;
        self
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Append a message, evicting the oldest ones past `max_messages`.
    ///
    /// With `preserve_system_prompt`, system messages survive eviction and
    /// only the other roles are trimmed.
    pub async fn add_message(
        &self,
        id: &ConversationId,
        message: Message,
    ) -> Result<(), ContextError> {
        self.store.add(id, message).await?;

        let messages = self.store.get(id).await?;
        let limit = self.config.max_messages;
        if messages.len() <= limit {
            return Ok(());
        }

        let kept = if self.config.preserve_system_prompt {
            let (system, others): (Vec<_>, Vec<_>) =
                messages.into_iter().partition(|m| m.role == Role::System);
            let room = limit.saturating_sub(system.len());
            let skip = others.len().saturating_sub(room);
            system.into_iter().chain(others.into_iter().skip(skip)).collect()
        } else {
            let skip = messages.len() - limit;
            messages.into_iter().skip(skip).collect::<Vec<_>>()
        };

        debug!(conversation = %id, kept = kept.len(), "Evicted old messages");
        self.store.set(id, kept).await
    }

    pub async fn get_messages(&self, id: &ConversationId) -> Result<Vec<Message>, ContextError> {
        self.store.get(id).await
    }

    pub async fn clear_context(&self, id: &ConversationId) -> Result<(), ContextError> {
        self.store.clear(id).await
    }

    /// Replace the history of `target` with a copy of `source`'s.
    pub async fn copy_context(
        &self,
        source: &ConversationId,
        target: &ConversationId,
    ) -> Result<(), ContextError> {
        let messages = self.store.get(source).await?;
        self.store.set(target, messages).await
    }

    pub fn calculate_tokens(&self, messages: &[Message]) -> usize {
        self.counter.count_messages(messages)
    }

    /// Fit `messages` into `max_tokens`.
    ///
    /// System messages are always kept. The rest are taken newest first
    /// until the next one would not fit; chronological order is preserved.
    pub fn truncate_context(&self, messages: Vec<Message>, max_tokens: usize) -> Vec<Message> {
        if self.calculate_tokens(&messages) <= max_tokens {
            return messages;
        }

        let (system, others): (Vec<_>, Vec<_>) =
            messages.into_iter().partition(|m| m.role == Role::System);
        let mut used = self.calculate_tokens(&system);

        let mut recent = Vec::new();
        for message in others.into_iter().rev() {
            let cost = self.counter.count_message(&message);
            if used + cost > max_tokens {
                break;
            }
            used += cost;
            recent.push(message);
        }
        recent.reverse();

        debug!(kept = system.len() + recent.len(), tokens = used, "Truncated context");
        system.into_iter().chain(recent).collect()
    }

    /// Condense a conversation into text of at most `max_tokens`.
    ///
    /// Short transcripts come back verbatim. A provider failure yields a
    /// placeholder naming the error rather than an `Err`.
    pub async fn summarize(
        &self,
        id: &ConversationId,
        max_tokens: usize,
        provider: &dyn Provider,
        model: &str,
    ) -> Result<String, ContextError> {
        let messages = self.store.get(id).await?;
        if messages.is_empty() {
            return Ok(String::new());
        }

        let transcript = messages
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        if self.counter.count(&transcript) < max_tokens {
            return Ok(transcript);
        }

        let excerpt: String = transcript.chars().take(10_000).collect();
        let prompt = format!(
            "Summarize this conversation in {max_tokens} tokens or less. Focus on:\n\
             1. Main topics discussed\n\
             2. Key decisions made\n\
             3. Important information to remember\n\n\
             Conversation:\n{excerpt}"
        );
        let mut request = ProviderRequest::new(model, vec![Message::system(prompt)]);
        request.max_tokens = u32::try_from(max_tokens).ok();

        match provider.generate(request).await {
            Ok(response) => Ok(response.content),
            Err(e) => {
                warn!(conversation = %id, error = %e, "Summarization failed");
                Ok(format!(
                    "Conversation with {} messages. (Summary unavailable: {e})",
                    messages.len()
                ))
            }
        }
    }

    pub async fn context_info(&self, id: &ConversationId) -> Result<ContextInfo, ContextError> {
        let messages = self.store.get(id).await?;
        let token_count = self.calculate_tokens(&messages);
        Ok(ContextInfo {
            conversation_id: id.clone(),
            message_count: messages.len(),
            token_count,
            is_truncated: messages.len() >= self.config.max_messages
                || token_count >= self.config.max_tokens,
            oldest_message: messages.first().map(|m| m.timestamp),
            latest_message: messages.last().map(|m| m.timestamp),
        })
    }
}
