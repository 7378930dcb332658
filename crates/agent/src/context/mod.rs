//! Conversation context: token estimation and history policy.

pub mod manager;
pub mod token;

pub use manager::{ContextInfo, ContextManager};
pub use token::{TokenCounter, estimate_tokens};
