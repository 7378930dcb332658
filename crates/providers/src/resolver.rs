//! Model → provider resolution.
//!
//! Model names are not unique across vendors, so resolution never guesses:
//! a model must be configured under exactly one provider, otherwise the
//! caller gets an error naming the problem.

use aifoundation_core::error::ResolveError;
use std::collections::BTreeMap;

/// Provider name → model type → model name.
pub type ProviderModels = BTreeMap<String, BTreeMap<String, String>>;

/// Find the one provider serving `model`.
///
/// Matching is exact after trimming and lowercasing. A model equal to a
/// provider's own name routes to that provider. Multiple matches are an
/// error listing all of them in sorted order.
pub fn resolve_provider(model: &str, providers: &ProviderModels) -> Result<String, ResolveError> {
    let wanted = model.trim().to_lowercase();
    if wanted.is_empty() {
        return Err(ResolveError::EmptyModel);
    }

    if let Some(name) = providers.keys().find(|name| name.to_lowercase() == wanted) {
        return Ok(name.clone());
    }

    let mut matches: Vec<String> = providers
        .iter()
        .filter(|(_, models)| {
            models
                .values()
                .any(|configured| configured.trim().to_lowercase() == wanted)
        })
        .map(|(name, _)| name.clone())
        .collect();
    matches.sort();

    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => Err(ResolveError::NotConfigured {
            model: model.to_string(),
        }),
        _ => Err(ResolveError::Ambiguous {
            model: model.to_string(),
            providers: matches,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn models(pairs: &[(&str, &[(&str, &str)])]) -> ProviderModels {
        pairs
            .iter()
            .map(|(provider, entries)| {
                let map = entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                (provider.to_string(), map)
            })
            .collect()
    }

    #[test]
    fn unique_model_resolves_to_its_provider() {
        let map = models(&[
            ("zhipu", &[("default", "chat-max-001")]),
            ("openai", &[("default", "gpt-4o")]),
        ]);
        assert_eq!(resolve_provider("chat-max-001", &map).unwrap(), "zhipu");
        assert_eq!(resolve_provider("gpt-4o", &map).unwrap(), "openai");
    }

    #[test]
    fn shared_model_is_ambiguous_and_names_both() {
        let map = models(&[
            ("zhipu", &[("default", "shared-model")]),
            ("openai", &[("fast", "shared-model")]),
        ]);
        let err = resolve_provider("shared-model", &map).unwrap_err();
        assert_eq!(
            err,
            ResolveError::Ambiguous {
                model: "shared-model".into(),
                providers: vec!["openai".into(), "zhipu".into()],
            }
        );
        let text = err.to_string();
        assert!(text.contains("openai"));
        assert!(text.contains("zhipu"));
    }

    #[test]
    fn unknown_model_is_not_configured() {
        let map = models(&[("openai", &[("default", "gpt-4o")])]);
        let err = resolve_provider("claude-3", &map).unwrap_err();
        assert!(matches!(err, ResolveError::NotConfigured { ref model } if model == "claude-3"));
    }

    #[test]
    fn matching_ignores_case_and_whitespace() {
        let map = models(&[("zhipu", &[("default", " GLM-4 ")])]);
        assert_eq!(resolve_provider("  glm-4\n", &map).unwrap(), "zhipu");
    }

    #[test]
    fn provider_name_routes_directly() {
        let map = models(&[
            ("deepseek", &[("default", "deepseek-chat")]),
            ("openai", &[("default", "deepseek")]),
        ]);
        // The provider-name escape hatch wins over a model-value match.
        assert_eq!(resolve_provider("DeepSeek", &map).unwrap(), "deepseek");
    }

    #[test]
    fn empty_model_is_rejected() {
        let map = models(&[("openai", &[("default", "gpt-4o")])]);
        assert_eq!(resolve_provider("   ", &map).unwrap_err(), ResolveError::EmptyModel);
    }

    #[test]
    fn same_model_twice_in_one_provider_is_one_match() {
        let map = models(&[("openai", &[("default", "gpt-4o"), ("chat", "gpt-4o")])]);
        assert_eq!(resolve_provider("gpt-4o", &map).unwrap(), "openai");
    }

    #[test]
    fn resolution_is_deterministic() {
        let map = models(&[
            ("a", &[("default", "m1")]),
            ("b", &[("default", "m1")]),
            ("c", &[("default", "m2")]),
        ]);
        for _ in 0..10 {
            assert!(resolve_provider("m1", &map).is_err());
            assert_eq!(resolve_provider("m2", &map).unwrap(), "c");
            assert!(resolve_provider("m3", &map).is_err());
        }
    }
}
