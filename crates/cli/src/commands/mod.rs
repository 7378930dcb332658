pub mod chat;
pub mod providers;
pub mod react;
pub mod resolve;
pub mod tools;

use aifoundation_config::AppConfig;
use aifoundation_core::agent::{AgentConfig, AgentType};
use aifoundation_providers::ProviderRegistry;
use std::sync::Arc;

/// Agent configuration from the `[agent]` section, with an optional model override.
pub fn agent_config(config: &AppConfig, agent_type: AgentType, model: Option<String>) -> AgentConfig {
    let defaults = &config.agent;
    let mut agent = AgentConfig::new(config.project.name.clone(), agent_type)
        .with_model(model.unwrap_or_else(|| defaults.model.clone()))
        .with_temperature(defaults.temperature)
        .with_max_iterations(defaults.max_iterations)
        .with_human_in_loop(config.human_in_loop.enabled);
    if let Some(max_tokens) = defaults.max_tokens {
        agent = agent.with_max_tokens(max_tokens);
    }
    if let Some(prompt) = &defaults.system_prompt {
        agent = agent.with_system_prompt(prompt.clone());
    }
    agent
}

pub fn registry(config: &AppConfig) -> anyhow::Result<Arc<ProviderRegistry>> {
    let registry = ProviderRegistry::from_config(config);
    if registry.is_empty() {
        anyhow::bail!(
            "no providers configured; add a [providers.<name>] section to {}",
            AppConfig::find_config_file().display()
        );
    }
    Ok(Arc::new(registry))
}
