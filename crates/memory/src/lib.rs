//! Context store implementations for AI Foundation.

pub mod in_memory;

pub use in_memory::InMemoryContextStore;
