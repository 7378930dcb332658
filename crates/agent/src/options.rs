//! Per-call knobs for `execute`.

use aifoundation_core::message::ConversationId;
use aifoundation_core::tool::ToolDispatch;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Clone, Default)]
pub struct ExecuteOptions {
    /// Conversation to read and extend. Defaults to the agent's name.
    pub conversation_id: Option<ConversationId>,
    /// Dispatch tools through this instead of the agent's own registry.
    pub tool_caller: Option<Arc<dyn ToolDispatch>>,
    /// Checked between iterations; a running provider or tool call is never
    /// interrupted.
    pub deadline: Option<Instant>,
}

impl ExecuteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conversation(mut self, id: impl Into<ConversationId>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    pub fn with_tool_caller(mut self, dispatcher: Arc<dyn ToolDispatch>) -> Self {
        self.tool_caller = Some(dispatcher);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub(crate) fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub(crate) fn conversation_or(&self, fallback: &str) -> ConversationId {
        self.conversation_id
            .clone()
            .unwrap_or_else(|| ConversationId::from(fallback))
    }
}
