//! `foundation providers`: Show configured providers.

use aifoundation_config::AppConfig;
use aifoundation_providers::ProviderRegistry;

pub async fn run(config: &AppConfig) -> anyhow::Result<()> {
    let registry = ProviderRegistry::from_config(config);
    if registry.is_empty() {
        println!("  No providers configured.");
        println!();
        println!("  Add one to {}:", AppConfig::find_config_file().display());
        println!("    [providers.zhipu]");
        println!("    enabled = true");
        println!("    models = {{ default = \"glm-4\" }}");
        println!();
        println!("  API keys are read from <PROVIDER>_API_KEY, e.g. ZHIPU_API_KEY.");
        return Ok(());
    }

    let available = registry.available_providers().await;

    println!("  {:<12} {:<8} {:<5} {:<10} Models", "Provider", "Enabled", "Key", "Status");
    for (name, provider) in registry.list() {
        let models = provider
            .models
            .iter()
            .map(|(kind, model)| format!("{kind}={model}"))
            .collect::<Vec<_>>()
            .join(", ");
        let status = if available.iter().any(|n| n == name) {
            "ready"
        } else {
            "-"
        };
        println!(
            "  {:<12} {:<8} {:<5} {:<10} {}",
            name,
            if provider.enabled { "yes" } else { "no" },
            if provider.has_api_key() { "set" } else { "-" },
            status,
            models
        );
    }

    Ok(())
}
