//! Error types for the AI Foundation domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all agent-layer operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Model → provider resolution ---
    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Context store errors ---
    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the agent loop may absorb this error and keep going.
    ///
    /// Tool failures are always recoverable: they are fed back to the
    /// model as an observation.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Tool(e) => e.is_recoverable(),
            _ => false,
        }
    }

    /// Errors that must surface before the loop starts.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Config { .. }
                | Error::Resolve(_)
                | Error::Provider(ProviderError::NotConfigured(_))
                | Error::Provider(ProviderError::Disabled(_))
        )
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Provider disabled: {0}")]
    Disabled(String),

    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failure to map a model name onto exactly one configured provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Model name cannot be empty")]
    EmptyModel,

    #[error(
        "Unable to resolve provider for model '{model}' from configured providers. \
         Please ensure it exists under `providers.*.models`."
    )]
    NotConfigured { model: String },

    #[error(
        "Model '{model}' is configured in multiple providers: [{}]. \
         Please specify provider explicitly.",
        .providers.join(", ")
    )]
    Ambiguous {
        model: String,
        providers: Vec<String>,
    },
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Error executing '{tool_name}': {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid arguments for '{tool_name}': {reason}")]
    InvalidArguments { tool_name: String, reason: String },
}

impl ToolError {
    /// Tool failures never abort an agent run.
    pub fn is_recoverable(&self) -> bool {
        true
    }

    /// Name of the tool this error concerns.
    pub fn tool_name(&self) -> &str {
        match self {
            ToolError::NotFound(name) => name,
            ToolError::ExecutionFailed { tool_name, .. }
            | ToolError::InvalidArguments { tool_name, .. } => tool_name,
        }
    }

    /// The underlying message without the tool-name prefix.
    pub fn reason(&self) -> String {
        match self {
            ToolError::NotFound(name) => format!("Tool not found: {name}"),
            ToolError::ExecutionFailed { reason, .. } => reason.clone(),
            ToolError::InvalidArguments { reason, .. } => format!("invalid arguments: {reason}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Summarization failed: {0}")]
    Summarization(String),
}
