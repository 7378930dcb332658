//! Agents for AI Foundation.
//!
//! A ReAct agent alternates model calls with tool calls until the model
//! gives a final answer or the iteration budget runs out:
//!
//! 1. **Build context**: system prompt, rolling history, task and prior steps
//! 2. **Call the model** through the provider its model resolves to
//! 3. **Parse** the reply into a thought, an action and its input
//! 4. **Act**: run the tool (after review, if enabled) and record the observation
//!
//! A conversational agent makes one call per turn and keeps the dialogue in
//! a [`ContextManager`].

pub mod approval;
pub mod binding;
pub mod context;
pub mod history;
pub mod options;
pub mod parser;
pub mod patterns;
pub mod variant;

pub use approval::{
    ApprovalDecision, ApprovalGate, AutoApprove, HumanInLoop, PendingReview, ToolReviewRequest,
};
pub use binding::{BoundProvider, ProviderBinding};
pub use context::{ContextInfo, ContextManager, TokenCounter, estimate_tokens};
pub use history::{DEFAULT_HISTORY_WINDOW, RollingHistory};
pub use options::ExecuteOptions;
pub use parser::{KeywordParser, ResponseParser, StructuredParser};
pub use patterns::{ConversationalAgent, ReactAgent};
pub use variant::{Agent, AgentDeps};
