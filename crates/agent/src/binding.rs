//! How an agent obtains its provider.

use aifoundation_core::error::Error;
use aifoundation_core::provider::Provider;
use aifoundation_providers::ProviderRegistry;
use std::sync::Arc;
use tracing::debug;

/// A provider ready for requests, with the model name to send.
#[derive(Clone)]
pub struct BoundProvider {
    pub provider: Arc<dyn Provider>,
    pub model: String,
}

enum Source {
    Fixed(Arc<dyn Provider>),
    Registry(Arc<ProviderRegistry>),
}

/// Either a provider injected directly, or one resolved from the agent's
/// model through a [`ProviderRegistry`] on first use.
///
/// A resolved provider is kept for the agent's lifetime.
pub struct ProviderBinding {
    source: Source,
    bound: Option<BoundProvider>,
}

impl ProviderBinding {
    pub fn fixed(provider: Arc<dyn Provider>) -> Self {
        Self {
            source: Source::Fixed(provider),
            bound: None,
        }
    }

    pub fn registry(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            source: Source::Registry(registry),
            bound: None,
        }
    }

    /// Resolve (once) the provider serving `model`.
    ///
    /// Resolution failures and disabled providers are configuration errors.
    pub fn bind(&mut self, model: &str) -> Result<BoundProvider, Error> {
        if let Some(bound) = &self.bound {
            return Ok(bound.clone());
        }

        let bound = match &self.source {
            Source::Fixed(provider) => BoundProvider {
                provider: provider.clone(),
                model: model.to_string(),
            },
            Source::Registry(registry) => {
                let resolved = registry.provider_for_model(model)?;
                debug!(provider = %resolved.name, model = %resolved.model, "Agent bound to provider");
                BoundProvider {
                    provider: resolved.provider,
                    model: resolved.model,
                }
            }
        };

        self.bound = Some(bound.clone());
        Ok(bound)
    }
}

impl From<Arc<dyn Provider>> for ProviderBinding {
    fn from(provider: Arc<dyn Provider>) -> Self {
        Self::fixed(provider)
    }
}

impl From<Arc<ProviderRegistry>> for ProviderBinding {
    fn from(registry: Arc<ProviderRegistry>) -> Self {
        Self::registry(registry)
    }
}
