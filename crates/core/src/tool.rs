//! Tool trait and registry: the abstraction over agent capabilities.
//!
//! Tools are named, schema-described callables the agent can invoke by
//! name. Implementors either write a [`Tool`] by hand or register a plain
//! function (sync or async) through [`ToolRegistry::register_fn`] /
//! [`ToolRegistry::register_async_fn`]. Both function shapes are wrapped
//! at registration into the same boxed-future adapter, so dispatch always
//! awaits one shape.

use async_trait::async_trait;
use futures::future::{self, BoxFuture};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// The result of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool executed successfully
    pub success: bool,

    /// The output rendered as text (what the model observes)
    pub output: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolResult {
    /// A successful textual result.
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            data: None,
        }
    }

    /// A successful structured result. Strings render without quotes.
    pub fn from_value(value: Value) -> Self {
        let output = match &value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self {
            success: true,
            output,
            data: Some(value),
        }
    }
}

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "calculator").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: Value) -> std::result::Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Name-based invocation, the only view of the registry an agent needs.
#[async_trait]
pub trait ToolDispatch: Send + Sync {
    /// Invoke `name` with `arguments` and render the result as text.
    async fn dispatch(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> std::result::Result<String, ToolError>;

    /// Declarations for every dispatchable tool.
    fn definitions(&self) -> Vec<ToolDefinition>;
}

type Handler = Arc<dyn Fn(Value) -> BoxFuture<'static, std::result::Result<Value, ToolError>> + Send + Sync>;

/// Adapter turning a plain function into a [`Tool`].
pub struct FnTool {
    name: String,
    description: String,
    schema: Value,
    handler: Handler,
}

impl FnTool {
    /// Wrap a synchronous function. `A` is the argument struct the model
    /// fills in; its schema is inferred unless `schema` is given.
    pub fn sync<A, R, E, F>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Option<Value>,
        func: F,
    ) -> Self
    where
        A: DeserializeOwned + JsonSchema,
        R: Serialize,
        E: Display,
        F: Fn(A) -> std::result::Result<R, E> + Send + Sync + 'static,
    {
        let name = name.into();
        let tool_name = name.clone();
        let handler: Handler = Arc::new(move |arguments| {
            let outcome = decode_arguments::<A>(&tool_name, arguments).and_then(|args| {
                func(args)
                    .map_err(|e| execution_failed(&tool_name, e))
                    .and_then(|r| encode_output(&tool_name, r))
            });
            Box::pin(future::ready(outcome))
        });
        Self {
            schema: schema.unwrap_or_else(infer_schema::<A>),
            name,
            description: description.into(),
            handler,
        }
    }

    /// Wrap an asynchronous function.
    pub fn asynchronous<A, R, E, F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Option<Value>,
        func: F,
    ) -> Self
    where
        A: DeserializeOwned + JsonSchema,
        R: Serialize,
        E: Display,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<R, E>> + Send + 'static,
    {
        let name = name.into();
        let tool_name = name.clone();
        let handler: Handler = Arc::new(move |arguments| {
            let tool_name = tool_name.clone();
            match decode_arguments::<A>(&tool_name, arguments) {
                Ok(args) => {
                    let pending = func(args);
                    Box::pin(async move {
                        let output = pending
                            .await
                            .map_err(|e| execution_failed(&tool_name, e))?;
                        encode_output(&tool_name, output)
                    })
                }
                Err(e) => Box::pin(future::ready(Err(e))),
            }
        });
        Self {
            schema: schema.unwrap_or_else(infer_schema::<A>),
            name,
            description: description.into(),
            handler,
        }
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        self.schema.clone()
    }

    async fn execute(&self, arguments: Value) -> std::result::Result<ToolResult, ToolError> {
        let value = (self.handler)(arguments).await?;
        Ok(ToolResult::from_value(value))
    }
}

fn decode_arguments<A: DeserializeOwned>(
    tool_name: &str,
    arguments: Value,
) -> std::result::Result<A, ToolError> {
    // A missing argument object means "no arguments".
    let arguments = if arguments.is_null() {
        Value::Object(Map::new())
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool_name: tool_name.to_string(),
        reason: e.to_string(),
    })
}

fn encode_output<R: Serialize>(tool_name: &str, output: R) -> std::result::Result<Value, ToolError> {
    serde_json::to_value(output).map_err(|e| execution_failed(tool_name, e))
}

fn execution_failed(tool_name: &str, reason: impl Display) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: tool_name.to_string(),
        reason: reason.to_string(),
    }
}

/// Build a flat parameter schema from the argument type.
///
/// Every property is reduced to one primitive type (`integer`, `number`,
/// `boolean`, `array`, `object` or `string`, the fallback). A property is
/// required unless it has a default or is optional.
pub fn infer_schema<A: JsonSchema>() -> Value {
    let generated = serde_json::to_value(schemars::schema_for!(A)).unwrap_or_else(|_| json!({}));

    let mut properties = Map::new();
    if let Some(props) = generated.get("properties").and_then(Value::as_object) {
        for (key, prop) in props {
            let mut entry = Map::new();
            entry.insert("type".into(), Value::String(primitive_type(prop).into()));
            if let Some(desc) = prop.get("description") {
                entry.insert("description".into(), desc.clone());
            }
            properties.insert(key.clone(), Value::Object(entry));
        }
    }

    let required = generated
        .get("required")
        .cloned()
        .unwrap_or_else(|| Value::Array(Vec::new()));

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn primitive_type(property: &Value) -> &'static str {
    let declared = match property.get("type") {
        Some(Value::String(t)) => Some(t.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ => None,
    };
    match declared {
        Some("integer") => "integer",
        Some("number") => "number",
        Some("boolean") => "boolean",
        Some("array") => "array",
        Some("object") => "object",
        Some(_) => "string",
        // Nested structs are emitted as references.
        None if property.get("$ref").is_some() => "object",
        None => "string",
    }
}

/// A registry of available tools.
///
/// Iteration order is by name so listings are stable.
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        debug!(tool = %name, "Registering tool");
        self.tools.insert(name, tool);
    }

    /// Register a synchronous function as a tool.
    pub fn register_fn<A, R, E, F>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Option<Value>,
        func: F,
    ) where
        A: DeserializeOwned + JsonSchema,
        R: Serialize,
        E: Display,
        F: Fn(A) -> std::result::Result<R, E> + Send + Sync + 'static,
    {
        self.register(Box::new(FnTool::sync(name, description, schema, func)));
    }

    /// Register an asynchronous function as a tool.
    pub fn register_async_fn<A, R, E, F, Fut>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Option<Value>,
        func: F,
    ) where
        A: DeserializeOwned + JsonSchema,
        R: Serialize,
        E: Display,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<R, E>> + Send + 'static,
    {
        self.register(Box::new(FnTool::asynchronous(name, description, schema, func)));
    }

    /// Remove a tool. Returns whether it was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.tools.remove(name).is_some()
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// All tool declarations, sorted by name.
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Execute a tool by name.
    ///
    /// Unknown names fail with [`ToolError::NotFound`]. Arguments the tool
    /// cannot decode come back as [`ToolError::InvalidArguments`], anything
    /// else it raises as [`ToolError::ExecutionFailed`].
    pub async fn execute(
        &self,
        name: &str,
        arguments: Value,
    ) -> std::result::Result<ToolResult, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        tool.execute(arguments).await.map_err(|e| match e {
            ToolError::ExecutionFailed { .. } | ToolError::InvalidArguments { .. } => e,
            ToolError::NotFound(missing) => execution_failed(name, format!("Tool not found: {missing}")),
        })
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolDispatch for ToolRegistry {
    async fn dispatch(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> std::result::Result<String, ToolError> {
        let result = self.execute(name, Value::Object(arguments)).await?;
        Ok(result.output)
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        self.list()
    }
}
