//! # AI Foundation Core
//!
//! Domain types, traits, and error definitions for the AI Foundation agent
//! layer. This crate performs **no I/O**; it defines the domain model that
//! all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the agent loop is a trait here: [`Provider`] for
//! LLM vendors, [`ToolDispatch`] for tools, [`ContextStore`] for
//! conversation storage. Implementations live in their own crates, and
//! tests swap in scripted mocks.

pub mod agent;
pub mod error;
pub mod event;
pub mod memory;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{
    AgentConfig, AgentInfo, AgentResult, AgentType, ReactStep, StepSummary, ToolCallRecord,
};
pub use error::{ContextError, Error, ProviderError, ResolveError, Result, ToolError};
pub use event::{DomainEvent, EventBus};
pub use memory::ContextStore;
pub use message::{ConversationId, Message, MessageToolCall, Role};
pub use provider::{
    ModelInfo, Provider, ProviderRequest, ProviderResponse, StreamChunk, ToolDefinition, Usage,
};
pub use tool::{FnTool, Tool, ToolDispatch, ToolRegistry, ToolResult};
