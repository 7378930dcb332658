//! Provider registry: configured vendors, lazily built clients.
//!
//! Clients are constructed on first use and cached under their name plus
//! a normalized copy of their configuration, so a changed entry yields a
//! fresh client while repeated lookups share one.

use crate::openai_compat::OpenAiCompatProvider;
use crate::resolver::{ProviderModels, resolve_provider};
use aifoundation_config::{AppConfig, ProviderConfig};
use aifoundation_core::error::{Error, ProviderError};
use aifoundation_core::provider::Provider;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Builds a client for a named provider from its configuration.
pub type ProviderFactory =
    Arc<dyn Fn(&str, &ProviderConfig) -> Result<Arc<dyn Provider>, ProviderError> + Send + Sync>;

/// A provider picked for a model name.
#[derive(Clone)]
pub struct ResolvedProvider {
    pub name: String,
    /// The concrete model to request. When the caller named the provider
    /// itself, this is that provider's default model.
    pub model: String,
    pub provider: Arc<dyn Provider>,
}

impl std::fmt::Debug for ResolvedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedProvider")
            .field("name", &self.name)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

pub struct ProviderRegistry {
    configs: BTreeMap<String, ProviderConfig>,
    factories: HashMap<String, ProviderFactory>,
    default_factory: ProviderFactory,
    instances: HashMap<String, Arc<dyn Provider>>,
    cache: Mutex<HashMap<(String, String), Arc<dyn Provider>>>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    /// An empty registry whose clients speak the OpenAI-compatible protocol.
    pub fn new() -> Self {
        let default_factory: ProviderFactory = Arc::new(|name, config| {
            Ok(Arc::new(OpenAiCompatProvider::from_config(name, config)?) as Arc<dyn Provider>)
        });
        Self {
            configs: BTreeMap::new(),
            factories: HashMap::new(),
            default_factory,
            instances: HashMap::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Registry over every `[providers.*]` entry of the application config.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut registry = Self::new();
        for (name, provider) in &config.providers {
            registry.register_config(name.clone(), provider.clone());
        }
        info!(
            providers = registry.configs.len(),
            enabled = registry.configs.values().filter(|c| c.enabled).count(),
            "Provider registry loaded"
        );
        registry
    }

    pub fn register_config(&mut self, name: impl Into<String>, config: ProviderConfig) {
        let name = name.into();
        debug!(provider = %name, enabled = config.enabled, "Registered provider config");
        self.configs.insert(name, config);
    }

    /// Use `factory` instead of the OpenAI-compatible client for `name`.
    pub fn register_factory(&mut self, name: impl Into<String>, factory: ProviderFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Serve `name` with a ready-made client.
    pub fn register_instance(
        &mut self,
        name: impl Into<String>,
        config: ProviderConfig,
        provider: Arc<dyn Provider>,
    ) {
        let name = name.into();
        self.instances.insert(name.clone(), provider);
        self.register_config(name, config);
    }

    /// The client for a named provider.
    ///
    /// Unknown names and disabled entries fail without building anything.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Provider>, ProviderError> {
        let config = self
            .configs
            .get(name)
            .ok_or_else(|| ProviderError::NotConfigured(name.to_string()))?;
        if !config.enabled {
            return Err(ProviderError::Disabled(name.to_string()));
        }

        if let Some(provider) = self.instances.get(name) {
            return Ok(provider.clone());
        }

        let key = (name.to_string(), cache_key(config));
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(provider) = cache.get(&key) {
            return Ok(provider.clone());
        }

        let factory = self.factories.get(name).unwrap_or(&self.default_factory);
        let provider = factory(name, config)?;
        debug!(provider = %name, "Built provider client");
        cache.insert(key, provider.clone());
        Ok(provider)
    }

    /// Resolve `model` to its unique provider and fetch the client.
    pub fn provider_for_model(&self, model: &str) -> Result<ResolvedProvider, Error> {
        let models = self.provider_models();
        let name = resolve_provider(model, &models)?;
        let provider = self.get(&name)?;

        let requested = model.trim();
        let model = if requested.eq_ignore_ascii_case(&name) {
            self.configs
                .get(&name)
                .and_then(|c| c.default_model())
                .unwrap_or_default()
                .to_string()
        } else {
            requested.to_string()
        };

        debug!(provider = %name, model = %model, "Resolved model");
        Ok(ResolvedProvider {
            name,
            model,
            provider,
        })
    }

    /// Provider name → model type → model name, over every registered entry.
    pub fn provider_models(&self) -> ProviderModels {
        self.configs
            .iter()
            .map(|(name, c)| (name.clone(), c.models.clone()))
            .collect()
    }

    /// Enabled providers whose client reports itself usable.
    pub async fn available_providers(&self) -> Vec<String> {
        let mut available = Vec::new();
        for name in self.configs.iter().filter(|(_, c)| c.enabled).map(|(n, _)| n) {
            if let Ok(provider) = self.get(name)
                && provider.is_available().await
            {
                available.push(name.clone());
            }
        }
        available
    }

    /// Every registered provider with its configuration, sorted by name.
    pub fn list(&self) -> impl Iterator<Item = (&str, &ProviderConfig)> {
        self.configs.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

fn cache_key(config: &ProviderConfig) -> String {
    // BTreeMap-backed fields serialize in a stable order.
    serde_json::to_string(config).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aifoundation_core::provider::{ProviderRequest, ProviderResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Named(String);

    #[async_trait]
    impl Provider for Named {
        fn name(&self) -> &str {
            &self.0
        }

        async fn generate(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse::text(format!("from {}", self.0), request.model))
        }
    }

    fn entry(enabled: bool, models: &[(&str, &str)]) -> ProviderConfig {
        ProviderConfig {
            enabled,
            api_key: Some("key".into()),
            models: models
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..ProviderConfig::default()
        }
    }

    fn counting_factory(counter: Arc<AtomicUsize>) -> ProviderFactory {
        Arc::new(move |name, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Named(name.to_string())) as Arc<dyn Provider>)
        })
    }

    #[test]
    fn clients_are_cached_per_config() {
        let built = Arc::new(AtomicUsize::new(0));
        let mut registry = ProviderRegistry::new();
        registry.register_factory("zhipu", counting_factory(built.clone()));
        registry.register_config("zhipu", entry(true, &[("default", "glm-4")]));

        let a = registry.get("zhipu").unwrap();
        let b = registry.get("zhipu").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(built.load(Ordering::SeqCst), 1);

        registry.register_config("zhipu", entry(true, &[("default", "glm-4-plus")]));
        registry.get("zhipu").unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unknown_and_disabled_providers_fail() {
        let mut registry = ProviderRegistry::new();
        registry.register_config("openai", entry(false, &[("default", "gpt-4o")]));

        assert!(matches!(
            registry.get("missing").err(),
            Some(ProviderError::NotConfigured(_))
        ));
        assert!(matches!(
            registry.get("openai").err(),
            Some(ProviderError::Disabled(_))
        ));
    }

    #[test]
    fn model_lookup_goes_through_the_resolver() {
        let mut registry = ProviderRegistry::new();
        registry.register_instance(
            "zhipu",
            entry(true, &[("default", "chat-max-001")]),
            Arc::new(Named("zhipu".into())),
        );
        registry.register_instance(
            "openai",
            entry(true, &[("default", "gpt-4o")]),
            Arc::new(Named("openai".into())),
        );

        let resolved = registry.provider_for_model("chat-max-001").unwrap();
        assert_eq!(resolved.name, "zhipu");
        assert_eq!(resolved.model, "chat-max-001");
        assert_eq!(resolved.provider.name(), "zhipu");

        let by_name = registry.provider_for_model("openai").unwrap();
        assert_eq!(by_name.model, "gpt-4o");

        let err = registry.provider_for_model("claude-3").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn ambiguous_model_surfaces_as_resolve_error() {
        let mut registry = ProviderRegistry::new();
        registry.register_config("zhipu", entry(true, &[("default", "shared-model")]));
        registry.register_config("openai", entry(true, &[("fast", "shared-model")]));
        let err = registry.provider_for_model("shared-model").unwrap_err();
        assert!(matches!(err, Error::Resolve(_)));
    }

    #[test]
    fn disabled_provider_still_claims_its_models() {
        let mut registry = ProviderRegistry::new();
        registry.register_config("openai", entry(false, &[("default", "gpt-4o")]));
        let err = registry.provider_for_model("gpt-4o").unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::Disabled(_))));
    }

    #[test]
    fn default_factory_builds_openai_compatible_clients() {
        let mut registry = ProviderRegistry::new();
        registry.register_config("deepseek", entry(true, &[("default", "deepseek-chat")]));
        let provider = registry.get("deepseek").unwrap();
        assert_eq!(provider.name(), "deepseek");
        assert_eq!(provider.model_info().model, "deepseek-chat");
    }

    #[tokio::test]
    async fn available_providers_skip_disabled_and_keyless() {
        let mut registry = ProviderRegistry::new();
        registry.register_config("openai", entry(true, &[("default", "gpt-4o")]));
        registry.register_config("zhipu", entry(false, &[("default", "glm-4")]));
        let mut keyless = entry(true, &[("default", "deepseek-chat")]);
        keyless.api_key = None;
        registry.register_config("deepseek", keyless);

        assert_eq!(registry.available_providers().await, vec!["openai".to_string()]);
    }

    #[test]
    fn from_app_config() {
        let mut app = AppConfig::default();
        app.providers
            .insert("zhipu".into(), entry(true, &[("default", "glm-4")]));
        let registry = ProviderRegistry::from_config(&app);
        assert!(!registry.is_empty());
        assert_eq!(registry.provider_models()["zhipu"]["default"], "glm-4");
        assert_eq!(registry.list().count(), 1);
    }
}
