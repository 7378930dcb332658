//! LLM provider plumbing for AI Foundation.
//!
//! All clients implement the `aifoundation_core::Provider` trait.
//! The resolver maps a model name onto exactly one configured provider,
//! and the registry builds and caches the client for it.

pub mod openai_compat;
pub mod registry;
pub mod resolver;

pub use openai_compat::OpenAiCompatProvider;
pub use registry::{ProviderFactory, ProviderRegistry, ResolvedProvider};
pub use resolver::{ProviderModels, resolve_provider};
