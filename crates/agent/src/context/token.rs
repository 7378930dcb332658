//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token, rounded up.
//! Good enough for budget decisions; a provider with a real tokenizer can
//! be attached to [`TokenCounter`] instead.

use aifoundation_core::message::Message;
use aifoundation_core::provider::Provider;
use std::sync::Arc;

/// Fixed cost of a message's role and framing.
pub const MESSAGE_OVERHEAD: usize = 4;

const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count for a string.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Counts tokens with the heuristic, or with a provider's tokenizer.
#[derive(Clone, Default)]
pub struct TokenCounter {
    provider: Option<Arc<dyn Provider>>,
}

impl TokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delegate text counting to `provider`.
    pub fn with_provider(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    pub fn count(&self, text: &str) -> usize {
        match &self.provider {
            Some(provider) => provider.count_tokens(text),
            None => estimate_tokens(text),
        }
    }

    pub fn count_message(&self, message: &Message) -> usize {
        MESSAGE_OVERHEAD + self.count(&message.content)
    }

    pub fn count_messages(&self, messages: &[Message]) -> usize {
        messages.iter().map(|m| self.count_message(m)).sum()
    }

    pub fn count_batch(&self, texts: &[&str]) -> Vec<usize> {
        texts.iter().map(|t| self.count(t)).collect()
    }

    /// Cut `text` to roughly `max_tokens`, on a character boundary.
    pub fn truncate_text(&self, text: &str, max_tokens: usize) -> String {
        if self.count(text) <= max_tokens {
            return text.to_string();
        }
        text.chars().take(max_tokens * CHARS_PER_TOKEN).collect()
    }
}
