//! Agent configuration, step and result types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::provider::ToolDefinition;

/// Which agent variant a configuration asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Conversational,
    #[default]
    React,
    Tool,
    Planning,
    MultiAgent,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Conversational => "conversational",
            AgentType::React => "react",
            AgentType::Tool => "tool",
            AgentType::Planning => "planning",
            AgentType::MultiAgent => "multi_agent",
        }
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for one agent instance. Immutable once the agent is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent name, also used in the default system prompt
    pub name: String,

    #[serde(default)]
    pub agent_type: AgentType,

    /// Empty means "use the variant's default prompt"
    #[serde(default)]
    pub system_prompt: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Hard ceiling on loop iterations per call
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Tool declarations the agent may call. Empty disables tool use.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    #[serde(default = "default_true")]
    pub memory_enabled: bool,

    /// Ask an approval gate before every tool call
    #[serde(default)]
    pub human_in_loop: bool,
}

fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_iterations() -> u32 {
    10
}
fn default_true() -> bool {
    true
}

impl AgentConfig {
    pub fn new(name: impl Into<String>, agent_type: AgentType) -> Self {
        Self {
            name: name.into(),
            agent_type,
            system_prompt: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            max_iterations: default_max_iterations(),
            max_tokens: None,
            tools: Vec::new(),
            memory_enabled: true,
            human_in_loop: false,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_human_in_loop(mut self, enabled: bool) -> Self {
        self.human_in_loop = enabled;
        self
    }

    /// Check the invariants an agent relies on.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::config("agent name must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::config(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        if self.max_iterations == 0 {
            return Err(Error::config("max_iterations must be at least 1"));
        }
        if self.model.trim().is_empty() {
            return Err(Error::config("model must not be empty"));
        }
        Ok(())
    }
}

/// One Thought → Action → Observation iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactStep {
    /// 1-based
    pub step_number: usize,
    pub thought: String,
    /// Tool name, or `"none"` for a final step
    pub action: Option<String>,
    pub action_input: Option<Map<String, Value>>,
    pub observation: Option<String>,
    pub is_final: bool,
}

impl ReactStep {
    /// The tool this step asks for, if any.
    pub fn requested_tool(&self) -> Option<&str> {
        self.action
            .as_deref()
            .filter(|a| !a.is_empty() && *a != FINAL_ACTION)
    }

    pub fn summary(&self) -> StepSummary {
        StepSummary {
            step: self.step_number,
            thought: self.thought.clone(),
            action: self.action.clone(),
            observation: self.observation.clone(),
        }
    }
}

/// Action value marking a step as the final answer.
pub const FINAL_ACTION: &str = "none";

/// Condensed view of a step carried in [`AgentResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSummary {
    pub step: usize,
    pub thought: String,
    pub action: Option<String>,
    pub observation: Option<String>,
}

/// A tool invocation made during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub step: usize,
    pub tool: String,
    pub arguments: Map<String, Value>,
    pub observation: String,
    pub success: bool,
}

/// The terminal value of one `execute` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub success: bool,
    pub output: String,
    #[serde(default)]
    pub intermediate_steps: Vec<StepSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRecord>>,
    #[serde(default)]
    pub tokens_used: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentResult {
    pub fn succeeded(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            intermediate_steps: Vec::new(),
            tool_calls: None,
            tokens_used: 0,
            error: None,
        }
    }

    pub fn failed(output: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            intermediate_steps: Vec::new(),
            tool_calls: None,
            tokens_used: 0,
            error: Some(error.into()),
        }
    }
}

/// Introspection snapshot of an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub agent_type: AgentType,
    pub model: String,
    pub temperature: f32,
    pub tools_count: usize,
    pub history_length: usize,
}
