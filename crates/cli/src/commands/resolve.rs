//! `foundation resolve`: Show which provider serves a model.

use aifoundation_config::AppConfig;
use aifoundation_providers::resolve_provider;

pub fn run(config: &AppConfig, model: &str) -> anyhow::Result<()> {
    let provider = resolve_provider(model, &config.model_map())?;
    let enabled = config.is_provider_enabled(&provider);
    println!("{model} -> {provider}{}", if enabled { "" } else { " (disabled)" });
    Ok(())
}
