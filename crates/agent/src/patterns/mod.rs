//! Agent patterns.
//!
//! 1. **ReAct**: Thought → Action → Observation loop with a visible trace
//! 2. **Conversational**: multi-turn dialogue over a shared context store

pub mod conversational;
pub mod react;

pub use conversational::ConversationalAgent;
pub use react::ReactAgent;

#[cfg(test)]
pub(crate) mod test_helpers;
