//! Configuration loading, validation, and management for AI Foundation.
//!
//! Loads configuration from the first file found among
//! `$AIFOUNDATION_CONFIG`, `config/default.toml`, `aifoundation.toml` and
//! `~/.aifoundation/config.toml`, then applies environment variable
//! overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Vendors with a well-known `<NAME>_API_KEY` environment variable.
pub const KNOWN_PROVIDERS: &[&str] = &[
    "openai",
    "anthropic",
    "google",
    "zhipu",
    "deepseek",
    "doubao",
    "minimax",
    "openrouter",
];

/// The root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub project: ProjectConfig,

    /// Defaults for agents built by the CLI
    #[serde(default)]
    pub agent: AgentDefaults,

    /// Conversation context limits
    #[serde(default)]
    pub context: ContextConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub human_in_loop: HumanInLoopConfig,

    /// Provider name → provider settings
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_project_name")]
    pub name: String,

    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_project_name() -> String {
    "ai-foundation".into()
}
fn default_environment() -> String {
    "development".into()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_project_name(),
            environment: default_environment(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefaults {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
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

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_iterations: default_max_iterations(),
            max_tokens: None,
            system_prompt: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Messages kept per conversation by the context manager
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,

    /// Token budget for `truncate_context`
    #[serde(default = "default_context_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_true")]
    pub preserve_system_prompt: bool,

    /// Conversational agent: per-message token budget
    #[serde(default = "default_tokens_per_message")]
    pub max_tokens_per_message: usize,

    /// Conversational agent: summarize once history exceeds this many messages
    #[serde(default = "default_summarization_threshold")]
    pub summarization_threshold: usize,

    #[serde(default = "default_true")]
    pub enable_summarization: bool,
}

fn default_max_messages() -> usize {
    20
}
fn default_context_tokens() -> usize {
    8000
}
fn default_tokens_per_message() -> usize {
    4000
}
fn default_summarization_threshold() -> usize {
    20
}
fn default_true() -> bool {
    true
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            max_tokens: default_context_tokens(),
            preserve_system_prompt: true,
            max_tokens_per_message: default_tokens_per_message(),
            summarization_threshold: default_summarization_threshold(),
            enable_summarization: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanInLoopConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Pending reviews are approved automatically after this many seconds
    #[serde(default = "default_review_timeout")]
    pub timeout_secs: u64,
}

fn default_review_timeout() -> u64 {
    5
}

impl Default for HumanInLoopConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_secs: default_review_timeout(),
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Overrides the vendor's well-known endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Model type ("default", "fast", ...) → model name
    #[serde(default)]
    pub models: BTreeMap<String, String>,

    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            base_url: None,
            models: BTreeMap::new(),
            timeout_secs: default_request_timeout(),
        }
    }
}

impl ProviderConfig {
    /// The model used when a caller names this provider directly.
    pub fn default_model(&self) -> Option<&str> {
        self.models
            .get("default")
            .or_else(|| self.models.values().next())
            .map(String::as_str)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("enabled", &self.enabled)
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("models", &self.models)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the first existing default location, then
    /// apply environment overrides:
    /// - `<PROVIDER>_API_KEY` for every configured or well-known provider
    /// - `AIFOUNDATION_MODEL` for the default agent model
    /// - `AIFOUNDATION_LOG_LEVEL` for the log filter
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::find_config_file();
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    ///
    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Locate the config file. Falls back to the user-level path even if it
    /// does not exist.
    pub fn find_config_file() -> PathBuf {
        if let Ok(explicit) = std::env::var("AIFOUNDATION_CONFIG") {
            return PathBuf::from(explicit);
        }
        let user_level = Self::config_dir().join("config.toml");
        [
            PathBuf::from("config/default.toml"),
            PathBuf::from("aifoundation.toml"),
        ]
        .into_iter()
        .find(|p| p.exists())
        .unwrap_or(user_level)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".aifoundation")
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let mut names: Vec<String> = KNOWN_PROVIDERS.iter().map(|s| s.to_string()).collect();
        names.extend(self.providers.keys().cloned());
        names.sort();
        names.dedup();

        for name in names {
            let var = format!("{}_API_KEY", name.to_uppercase().replace('-', "_"));
            if let Some(key) = lookup(&var).filter(|k| !k.is_empty()) {
                self.providers.entry(name).or_default().api_key = Some(key);
            }
        }

        if let Some(model) = lookup("AIFOUNDATION_MODEL").filter(|m| !m.is_empty()) {
            self.agent.model = model;
        }
        if let Some(level) = lookup("AIFOUNDATION_LOG_LEVEL").filter(|l| !l.is_empty()) {
            self.logging.level = level;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.agent.temperature) {
            return Err(ConfigError::ValidationError(
                "agent.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        if self.context.max_messages == 0 {
            return Err(ConfigError::ValidationError(
                "context.max_messages must be at least 1".into(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be \"text\" or \"json\", got \"{}\"",
                self.logging.format
            )));
        }

        for (name, provider) in &self.providers {
            if let Some((kind, _)) = provider.models.iter().find(|(_, m)| m.trim().is_empty()) {
                return Err(ConfigError::ValidationError(format!(
                    "providers.{name}.models.{kind} must not be empty"
                )));
            }
        }

        Ok(())
    }

    /// Snapshot of provider name → model-type → model-name, the input the
    /// provider resolver works on.
    pub fn model_map(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        self.providers
            .iter()
            .map(|(name, p)| (name.clone(), p.models.clone()))
            .collect()
    }

    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    pub fn is_provider_enabled(&self, name: &str) -> bool {
        self.provider(name).is_some_and(|p| p.enabled)
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            project: ProjectConfig::default(),
            agent: AgentDefaults::default(),
            context: ContextConfig::default(),
            logging: LoggingConfig::default(),
            human_in_loop: HumanInLoopConfig::default(),
            providers: BTreeMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
