//! Shared test helpers for agent tests.

use aifoundation_core::error::{ProviderError, ToolError};
use aifoundation_core::provider::{
    Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage,
};
use aifoundation_core::tool::ToolDispatch;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted responses.
///
/// Every request is recorded. Once the script runs out, the `repeat`
/// text is returned forever if set, otherwise the call panics.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    repeat: Option<String>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self::from_results(responses.into_iter().map(Ok).collect())
    }

    pub fn from_results(results: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            repeat: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Plain text responses in order.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| make_text_response(t)).collect())
    }

    /// The same text on every call.
    pub fn repeating(text: &str) -> Self {
        let mut provider = Self::new(Vec::new());
        provider.repeat = Some(text.to_string());
        provider
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn generate(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };

        if let Some(next) = self.script.lock().unwrap().pop_front() {
            return next;
        }
        match &self.repeat {
            Some(text) => Ok(make_text_response(text)),
            None => panic!("ScriptedProvider: no more responses (call #{call})"),
        }
    }
}

/// A text response with fixed usage (15 tokens).
pub fn make_text_response(text: &str) -> ProviderResponse {
    let mut response = ProviderResponse::text(text, "mock-model");
    response.usage = Usage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
    };
    response
}

/// A ReAct-formatted response requesting `tool`.
pub fn react_action(thought: &str, tool: &str, input: Value) -> String {
    format!("THOUGHT: {thought}\nACTION: {tool}\nACTION INPUT: {input}")
}

/// A ReAct-formatted final answer.
pub fn react_final(thought: &str) -> String {
    format!("THOUGHT: {thought}\nACTION: none\nACTION INPUT: {{}}")
}

/// A dispatcher that always fails with the given error.
pub struct FailingDispatch(pub ToolError);

#[async_trait::async_trait]
impl ToolDispatch for FailingDispatch {
    async fn dispatch(&self, _name: &str, _arguments: Map<String, Value>) -> Result<String, ToolError> {
        Err(self.0.clone())
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        Vec::new()
    }
}
