//! Built-in tool implementations for AI Foundation.
//!
//! Each tool is a plain function over a typed argument struct, registered
//! through the function adapter so its parameter schema is inferred.

pub mod calculator;
pub mod datetime;
pub mod file;

use aifoundation_core::tool::ToolRegistry;

/// Register every built-in tool into `registry`.
pub fn register_builtins(registry: &mut ToolRegistry) {
    registry.register_fn(
        calculator::NAME,
        calculator::DESCRIPTION,
        None,
        calculator::calculate,
    );
    registry.register_fn(
        datetime::NAME,
        datetime::DESCRIPTION,
        None,
        datetime::current_datetime,
    );
    registry.register_async_fn(file::READER_NAME, file::READER_DESCRIPTION, None, file::read_file);
    registry.register_async_fn(file::WRITER_NAME, file::WRITER_DESCRIPTION, None, file::write_file);
    tracing::debug!(tools = registry.len(), "Registered built-in tools");
}

/// Create a tool registry holding all built-in tools.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    register_builtins(&mut registry);
    registry
}
