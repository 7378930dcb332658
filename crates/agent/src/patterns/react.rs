//! ReAct pattern: Thought → Action → Observation loop.
//!
//! Each iteration makes exactly one provider call, parses the text into a
//! [`ReactStep`] and either finishes or runs the requested tool. The
//! iteration budget is a hard ceiling reported as a failed result.
//!
//! # Trace
//!
//! Every iteration records one step:
//! - **Thought**: the model's reasoning
//! - **Action**: tool name, or `none` for a final answer
//! - **Observation**: the tool's output, or the error it raised
//!
//! Tool failures never abort the loop; they become the observation and
//! the model gets to react to them.

use aifoundation_core::agent::{
    AgentConfig, AgentInfo, AgentResult, AgentType, ReactStep, ToolCallRecord,
};
use aifoundation_core::error::Error;
use aifoundation_core::event::{DomainEvent, EventBus};
use aifoundation_core::message::{ConversationId, Message};
use aifoundation_core::provider::{Provider, ProviderRequest, ToolDefinition};
use aifoundation_core::tool::{ToolDispatch, ToolRegistry};
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::approval::{ApprovalDecision, ApprovalGate, ToolReviewRequest};
use crate::binding::{BoundProvider, ProviderBinding};
use crate::history::RollingHistory;
use crate::options::ExecuteOptions;
use crate::parser::{KeywordParser, ResponseParser, StructuredParser};

/// Charged per step when the provider reports no usage.
const ESTIMATED_TOKENS_PER_STEP: u64 = 500;

/// Characters of each prior thought/observation repeated in the context.
const EXCERPT_CHARS: usize = 100;

pub const MAX_ITERATIONS_OUTPUT: &str = "Maximum iterations reached";

pub struct ReactAgent {
    config: AgentConfig,
    binding: ProviderBinding,
    tools: Arc<dyn ToolDispatch>,
    parser: Box<dyn ResponseParser>,
    history: RollingHistory,
    steps: Vec<ReactStep>,
    event_bus: Option<Arc<EventBus>>,
    approval: Option<Arc<dyn ApprovalGate>>,
}

/// Bookkeeping for one `execute` call.
#[derive(Default)]
struct Run {
    tokens_used: u64,
    tool_calls: Vec<ToolCallRecord>,
}

impl ReactAgent {
    /// Create a ReAct agent. Fails on an invalid configuration.
    ///
    /// `config.tools` declares what the model may call; `tools` executes it.
    pub fn new(
        config: AgentConfig,
        binding: impl Into<ProviderBinding>,
        tools: Arc<dyn ToolDispatch>,
    ) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            config,
            binding: binding.into(),
            tools,
            parser: Box::new(StructuredParser),
            history: RollingHistory::default(),
            steps: Vec::new(),
            event_bus: None,
            approval: None,
        })
    }

    /// A five-iteration agent that reads plain prose and stops at a
    /// "final answer" marker. It has no tools.
    pub fn simple(
        name: impl Into<String>,
        model: impl Into<String>,
        binding: impl Into<ProviderBinding>,
    ) -> Result<Self, Error> {
        let config = AgentConfig::new(name, AgentType::React)
            .with_model(model)
            .with_system_prompt("You are a helpful assistant that thinks step by step.")
            .with_max_iterations(5);
        Ok(Self::new(config, binding, Arc::new(ToolRegistry::new()))?.with_parser(KeywordParser))
    }

    pub fn with_parser(mut self, parser: impl ResponseParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Consulted before each tool call when `human_in_loop` is set.
    pub fn with_approval_gate(mut self, gate: Arc<dyn ApprovalGate>) -> Self {
        self.approval = Some(gate);
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run the loop on `task`.
    ///
    /// `Err` is reserved for configuration problems found before the first
    /// provider call. Everything after that, including budget exhaustion,
    /// comes back as an [`AgentResult`] with the partial trace.
    pub async fn execute(
        &mut self,
        task: &str,
        options: ExecuteOptions,
    ) -> Result<AgentResult, Error> {
        let bound = self.binding.bind(&self.config.model)?;
        let dispatcher = options
            .tool_caller
            .clone()
            .unwrap_or_else(|| self.tools.clone());
        let conversation = options.conversation_or(&self.config.name);

        self.steps.clear();
        self.history.push(Message::user(task));
        let system = Message::system(self.system_prompt());
        let max_iterations = self.config.max_iterations as usize;
        let mut run = Run::default();

        info!(
            agent = %self.config.name,
            model = %bound.model,
            max_iter = max_iterations,
            "ReAct loop starting"
        );

        for iteration in 1..=max_iterations {
            if options.deadline_passed() {
                warn!(agent = %self.config.name, iteration, "ReAct deadline passed");
                return Ok(self.finish(run, false, String::new(), Some("Execution deadline exceeded".into())));
            }

            debug!(iteration, "ReAct iteration");
            let step = match self
                .next_step(task, iteration, &bound, &system, &conversation, &mut run)
                .await
            {
                Ok(step) => step,
                Err(e) => {
                    warn!(agent = %self.config.name, iteration, error = %e, "ReAct iteration failed");
                    return Ok(self.finish(run, false, String::new(), Some(e.to_string())));
                }
            };

            self.publish(DomainEvent::StepRecorded {
                agent: self.config.name.clone(),
                step_number: step.step_number,
                action: step.action.clone(),
                is_final: step.is_final,
                timestamp: Utc::now(),
            });
            self.steps.push(step.clone());

            if step.is_final {
                let output = step.observation.unwrap_or(step.thought);
                info!(iterations = iteration, tool_calls = run.tool_calls.len(), "ReAct loop completed");
                return Ok(self.finish(run, true, output, None));
            }

            let Some(tool) = step.requested_tool() else {
                continue;
            };

            if self.config.tools.is_empty() {
                // Nothing could ever satisfy the request; stop instead of
                // letting the model ask again until the budget runs out.
                debug!(tool, "Tool requested but none are configured");
                return Ok(self.finish(run, true, step.thought, None));
            }

            let arguments = step.action_input.clone().unwrap_or_default();
            let record = self
                .act(task, step.step_number, tool, arguments, dispatcher.as_ref())
                .await;

            if let Some(recorded) = self.steps.last_mut() {
                recorded.observation = Some(record.observation.clone());
            }
            self.history
                .push(Message::tool(format!("Observation: {}", record.observation)));
            run.tool_calls.push(record);
        }

        warn!(agent = %self.config.name, max_iter = max_iterations, "ReAct: max iterations reached");
        Ok(self.finish(
            run,
            false,
            MAX_ITERATIONS_OUTPUT.to_string(),
            Some(format!("Exceeded maximum iterations ({max_iterations})")),
        ))
    }

    /// One provider call, parsed into a step.
    async fn next_step(
        &self,
        task: &str,
        iteration: usize,
        bound: &BoundProvider,
        system: &Message,
        conversation: &ConversationId,
        run: &mut Run,
    ) -> Result<ReactStep, Error> {
        let context = build_context(task, iteration, self.config.max_iterations, &self.steps);

        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(system.clone());
        messages.extend(self.history.iter().cloned());
        messages.push(Message::user(context));

        let mut request = ProviderRequest::new(bound.model.clone(), messages);
        request.temperature = self.config.temperature;
        request.max_tokens = self.config.max_tokens;

        let response = bound.provider.generate(request).await?;

        let total = u64::from(response.usage.total_tokens);
        run.tokens_used += if total > 0 { total } else { ESTIMATED_TOKENS_PER_STEP };
        self.publish(DomainEvent::ResponseGenerated {
            conversation_id: conversation.to_string(),
            model: response.model.clone(),
            tokens_used: response.usage.total_tokens,
            timestamp: Utc::now(),
        });

        Ok(self.parser.parse(&response.content, iteration))
    }

    /// Review (if enabled) and run one tool call.
    async fn act(
        &self,
        task: &str,
        step: usize,
        tool: &str,
        mut arguments: Map<String, Value>,
        dispatcher: &dyn ToolDispatch,
    ) -> ToolCallRecord {
        if let Some(gate) = self.approval.as_ref().filter(|_| self.config.human_in_loop) {
            let request = ToolReviewRequest {
                agent: self.config.name.clone(),
                task: task.to_string(),
                tool: tool.to_string(),
                arguments: arguments.clone(),
            };
            match gate.review(request).await {
                ApprovalDecision::Approve => {}
                ApprovalDecision::Modify { arguments: modified } => arguments = modified,
                ApprovalDecision::Reject { reason } => {
                    info!(tool, reason = %reason, "Tool call rejected by reviewer");
                    return ToolCallRecord {
                        step,
                        tool: tool.to_string(),
                        arguments,
                        observation: format!("Action rejected by reviewer: {reason}"),
                        success: false,
                    };
                }
            }
        }

        debug!(tool, "Dispatching tool");
        let start = std::time::Instant::now();
        let outcome = dispatcher.dispatch(tool, arguments.clone()).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let (observation, success) = match outcome {
            Ok(output) => (output, true),
            Err(e) => {
                warn!(tool, error = %e, "Tool call failed");
                (format!("Error executing {tool}: {}", e.reason()), false)
            }
        };

        self.publish(DomainEvent::ToolExecuted {
            tool_name: tool.to_string(),
            success,
            duration_ms,
            timestamp: Utc::now(),
        });

        ToolCallRecord {
            step,
            tool: tool.to_string(),
            arguments,
            observation,
            success,
        }
    }

    fn finish(&self, run: Run, success: bool, output: String, error: Option<String>) -> AgentResult {
        AgentResult {
            success,
            output,
            intermediate_steps: self.steps.iter().map(ReactStep::summary).collect(),
            tool_calls: (!run.tool_calls.is_empty()).then_some(run.tool_calls),
            tokens_used: run.tokens_used,
            error,
        }
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }

    fn system_prompt(&self) -> String {
        if self.config.system_prompt.trim().is_empty() {
            default_system_prompt(&self.config.name, &self.config.tools)
        } else {
            self.config.system_prompt.clone()
        }
    }

    /// Steps recorded by the most recent `execute`.
    pub fn execution_trace(&self) -> Vec<ReactStep> {
        self.steps.clone()
    }

    pub fn plan(&self, task: &str) -> Vec<String> {
        vec![
            format!("Analyze task: {task}"),
            "Determine if tools are needed".to_string(),
            "Execute reasoning-action-observation loop".to_string(),
            "Formulate final answer".to_string(),
        ]
    }

    /// A result is acceptable when it succeeded and recorded at least one step.
    pub fn evaluate(&self, result: &AgentResult) -> bool {
        result.success && !result.intermediate_steps.is_empty()
    }

    pub fn info(&self) -> AgentInfo {
        AgentInfo {
            name: self.config.name.clone(),
            agent_type: self.config.agent_type,
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            tools_count: self.config.tools.len(),
            history_length: self.history.len(),
        }
    }

    pub fn history(&self) -> Vec<Message> {
        self.history.to_vec()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

/// The per-iteration user turn: task, progress and condensed prior steps.
fn build_context(task: &str, iteration: usize, max_iterations: u32, steps: &[ReactStep]) -> String {
    let mut lines = vec![
        format!("**Task**: {task}"),
        format!("**Iteration**: {iteration}/{max_iterations}"),
    ];

    if !steps.is_empty() {
        lines.push("**Previous Steps**:".to_string());
        for step in steps {
            lines.push(format!("- Step {}: {}...", step.step_number, excerpt(&step.thought)));
            if let Some(observation) = &step.observation {
                lines.push(format!("  Observation: {}...", excerpt(observation)));
            }
        }
    }

    lines.join("\n")
}

fn excerpt(text: &str) -> String {
    text.chars().take(EXCERPT_CHARS).collect()
}

fn describe_tools(tools: &[ToolDefinition]) -> String {
    if tools.is_empty() {
        return "No tools available.".to_string();
    }

    tools
        .iter()
        .map(|tool| {
            let mut line = format!("- **{}**: {}", tool.name, tool.description);
            let params: Vec<String> = tool
                .parameters
                .get("properties")
                .and_then(Value::as_object)
                .map(|props| props.keys().map(|k| format!("`{k}`")).collect())
                .unwrap_or_default();
            if !params.is_empty() {
                line.push_str(&format!(" (params: {})", params.join(", ")));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn default_system_prompt(name: &str, tools: &[ToolDefinition]) -> String {
    format!(
        r#"You are {name}, an AI assistant that uses the ReAct (Reasoning and Acting) pattern.

## Your Approach

You solve problems through a structured reasoning process:

1. **THOUGHT**: Analyze the problem and plan your next action
2. **ACTION**: Decide on a tool to use (if needed)
3. **ACTION INPUT**: Provide the input for the tool
4. **OBSERVATION**: Review the result of your action

Repeat this cycle until you reach a final answer.

## Rules

- Think carefully before each action
- If an action fails, try a different approach
- Use tools only when necessary
- Always conclude with a final answer when done

## Available Tools

{tools}

## Output Format

When you need to use a tool, respond with:
```
THOUGHT: [Your reasoning]
ACTION: [tool_name]
ACTION INPUT: {{"param1": "value1"}}
```

When you have the final answer:
```
THOUGHT: [Your final answer]
ACTION: none
ACTION INPUT: {{}}
```"#,
        tools = describe_tools(tools)
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::AutoApprove;
    use crate::patterns::test_helpers::*;
    use aifoundation_config::ProviderConfig;
    use aifoundation_core::error::{ProviderError, ToolError};
    use aifoundation_core::message::Role;
    use aifoundation_providers::ProviderRegistry;
    use serde_json::json;

    fn tool_config(max_iterations: u32) -> AgentConfig {
        let registry = aifoundation_tools::default_registry();
        AgentConfig::new("solver", AgentType::React)
            .with_model("mock-model")
            .with_max_iterations(max_iterations)
            .with_tools(registry.list())
    }

    fn agent_with(provider: Arc<ScriptedProvider>, config: AgentConfig) -> ReactAgent {
        let tools = Arc::new(aifoundation_tools::default_registry());
        ReactAgent::new(config, ProviderBinding::fixed(provider), tools).unwrap()
    }

    #[tokio::test]
    async fn single_tool_call_then_answer() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            &react_action("I need to add", "calculator", json!({"expression": "2+2"})),
            &react_final("The answer is 4"),
        ]));
        let mut agent = agent_with(provider.clone(), tool_config(10));

        let result = agent.execute("What is 2+2?", ExecuteOptions::new()).await.unwrap();

        assert!(result.success);
        assert_eq!(result.output, "The answer is 4");
        assert_eq!(result.intermediate_steps.len(), 2);
        assert_eq!(result.intermediate_steps[0].observation.as_deref(), Some("4"));
        assert_eq!(result.tokens_used, 30);

        let calls = result.tool_calls.unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tool, "calculator");
        assert!(calls[0].success);

        let trace = agent.execution_trace();
        assert_eq!(trace[0].action.as_deref(), Some("calculator"));
        assert!(trace[1].is_final);

        // The second request carries the observation in history and context.
        let second = &provider.requests()[1];
        assert!(second.messages.iter().any(|m| m.content == "Observation: 4"));
        let context = &second.messages.last().unwrap().content;
        assert!(context.contains("**Iteration**: 2/10"));
        assert!(context.contains("  Observation: 4..."));
    }

    #[tokio::test]
    async fn budget_is_a_hard_ceiling() {
        let provider = Arc::new(ScriptedProvider::repeating(&react_action(
            "again",
            "calculator",
            json!({"expression": "1+1"}),
        )));
        let mut agent = agent_with(provider.clone(), tool_config(3));

        let result = agent.execute("loop forever", ExecuteOptions::new()).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.output, MAX_ITERATIONS_OUTPUT);
        assert!(result.error.unwrap().contains("3"));
        assert_eq!(result.intermediate_steps.len(), 3);
        assert_eq!(provider.call_count(), 3);
        assert!(agent.execution_trace().iter().all(|s| !s.is_final));
    }

    #[tokio::test]
    async fn tool_request_without_tools_short_circuits() {
        let provider = Arc::new(ScriptedProvider::texts(&[&react_action(
            "let me search",
            "search",
            json!({"q": "x"}),
        )]));
        let config = AgentConfig::new("bare", AgentType::React).with_model("mock-model");
        let mut agent = agent_with(provider.clone(), config);

        let result = agent.execute("find x", ExecuteOptions::new()).await.unwrap();

        assert!(result.success);
        assert_eq!(result.output, "let me search");
        assert_eq!(provider.call_count(), 1);
        assert!(result.tool_calls.is_none());
    }

    #[tokio::test]
    async fn unknown_tool_becomes_observation() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            &react_action("try it", "telescope", json!({})),
            &react_final("no telescope, giving up"),
        ]));
        let mut agent = agent_with(provider, tool_config(5));

        let result = agent.execute("look up", ExecuteOptions::new()).await.unwrap();

        assert!(result.success);
        let observation = result.intermediate_steps[0].observation.clone().unwrap();
        assert_eq!(observation, "Error executing telescope: Tool not found: telescope");
        assert!(!result.tool_calls.unwrap()[0].success);
    }

    #[tokio::test]
    async fn malformed_action_input_without_tools_returns_thought() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            "THOUGHT: need data\nACTION: search\nACTION INPUT: {bad json",
        ]));
        let config = AgentConfig::new("bare", AgentType::React).with_model("mock-model");
        let mut agent = agent_with(provider.clone(), config);

        let result = agent.execute("look it up", ExecuteOptions::new()).await.unwrap();

        assert!(result.success);
        assert_eq!(result.output, "need data");
        assert_eq!(provider.call_count(), 1);
        assert!(result.tool_calls.is_none());
    }

    #[tokio::test]
    async fn registered_tool_error_reaches_next_prompt() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            &react_action("divide", "calculator", json!({"expression": "1/0"})),
            &react_final("cannot divide by zero"),
        ]));
        let mut agent = agent_with(provider.clone(), tool_config(5));

        let result = agent.execute("What is 1/0?", ExecuteOptions::new()).await.unwrap();

        assert!(result.success);
        assert_eq!(result.output, "cannot divide by zero");
        let observation = result.intermediate_steps[0].observation.as_deref().unwrap();
        assert!(observation.starts_with("Error executing calculator: "));
        assert!(observation.contains("division by zero"));

        let calls = result.tool_calls.unwrap();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].success);

        let second = &provider.requests()[1];
        let context = &second.messages.last().unwrap().content;
        assert!(context.contains("  Observation: Error executing"));
    }

    #[tokio::test]
    async fn failing_tool_caller_is_contained() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            &react_action("divide", "calculator", json!({"expression": "1/0"})),
            &react_final("could not divide"),
        ]));
        let mut agent = agent_with(provider, tool_config(5));
        let failing = Arc::new(FailingDispatch(ToolError::ExecutionFailed {
            tool_name: "calculator".into(),
            reason: "boom".into(),
        }));

        let result = agent
            .execute("1/0", ExecuteOptions::new().with_tool_caller(failing))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(
            result.intermediate_steps[0].observation.as_deref(),
            Some("Error executing calculator: boom")
        );
        assert_eq!(result.output, "could not divide");
    }

    #[tokio::test]
    async fn unstructured_reply_finishes_immediately() {
        let provider = Arc::new(ScriptedProvider::texts(&["Paris is the capital."]));
        let mut agent = agent_with(provider, tool_config(5));

        let result = agent.execute("capital of France?", ExecuteOptions::new()).await.unwrap();

        assert!(result.success);
        assert_eq!(result.output, "Paris is the capital.");
        assert!(agent.evaluate(&result));
    }

    #[tokio::test]
    async fn provider_failure_is_a_failed_result() {
        let provider = Arc::new(ScriptedProvider::from_results(vec![
            Ok(make_text_response(&react_action(
                "add",
                "calculator",
                json!({"expression": "1+2"}),
            ))),
            Err(ProviderError::RateLimited { retry_after_secs: 5 }),
        ]));
        let mut agent = agent_with(provider, tool_config(5));

        let result = agent.execute("1+2", ExecuteOptions::new()).await.unwrap();

        assert!(!result.success);
        assert!(result.error.as_ref().unwrap().contains("Rate limited"));
        assert_eq!(result.intermediate_steps.len(), 1);
        assert!(!agent.evaluate(&result));
    }

    #[tokio::test]
    async fn unresolvable_model_is_an_error_before_any_call() {
        let mut registry = ProviderRegistry::new();
        registry.register_config(
            "zhipu",
            ProviderConfig {
                enabled: true,
                models: [("default".to_string(), "glm-4".to_string())].into(),
                ..ProviderConfig::default()
            },
        );
        let config = AgentConfig::new("a", AgentType::React).with_model("unknown-model");
        let mut agent = ReactAgent::new(
            config,
            Arc::new(registry),
            Arc::new(ToolRegistry::new()),
        )
        .unwrap();

        let err = agent.execute("hi", ExecuteOptions::new()).await.unwrap_err();
        assert!(err.is_configuration());
        assert!(agent.execution_trace().is_empty());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let provider: Arc<dyn Provider> = Arc::new(ScriptedProvider::new(vec![]));
        let config = AgentConfig::new("a", AgentType::React).with_max_iterations(0);
        assert!(ReactAgent::new(config, provider, Arc::new(ToolRegistry::new())).is_err());
    }

    #[tokio::test]
    async fn passed_deadline_stops_before_calling() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let mut agent = agent_with(provider.clone(), tool_config(5));
        let options = ExecuteOptions::new().with_deadline(tokio::time::Instant::now());

        let result = agent.execute("late", options).await.unwrap();

        assert!(!result.success);
        assert!(result.error.unwrap().contains("deadline"));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn history_is_ordered_and_trace_resets() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            &react_action("add", "calculator", json!({"expression": "3*3"})),
            &react_final("9"),
            &react_final("hello"),
        ]));
        let mut agent = agent_with(provider, tool_config(5));

        agent.execute("3*3", ExecuteOptions::new()).await.unwrap();
        assert_eq!(agent.execution_trace().len(), 2);

        agent.execute("say hello", ExecuteOptions::new()).await.unwrap();
        assert_eq!(agent.execution_trace().len(), 1);

        let history = agent.history();
        let roles: Vec<Role> = history.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Tool, Role::User]);
        assert_eq!(history[1].content, "Observation: 9");
        assert_eq!(agent.info().history_length, 3);

        agent.clear_history();
        assert!(agent.history().is_empty());
    }

    #[tokio::test]
    async fn rejected_tool_call_is_observed() {
        struct RejectAll;
        #[async_trait::async_trait]
        impl ApprovalGate for RejectAll {
            async fn review(&self, _request: ToolReviewRequest) -> ApprovalDecision {
                ApprovalDecision::Reject {
                    reason: "too risky".into(),
                }
            }
        }

        let provider = Arc::new(ScriptedProvider::texts(&[
            &react_action("add", "calculator", json!({"expression": "1+1"})),
            &react_final("ok, not running it"),
        ]));
        let config = tool_config(5).with_human_in_loop(true);
        let mut agent = agent_with(provider, config).with_approval_gate(Arc::new(RejectAll));

        let result = agent.execute("1+1", ExecuteOptions::new()).await.unwrap();

        assert_eq!(
            result.intermediate_steps[0].observation.as_deref(),
            Some("Action rejected by reviewer: too risky")
        );
    }

    #[tokio::test]
    async fn approved_tool_call_runs() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            &react_action("add", "calculator", json!({"expression": "5+5"})),
            &react_final("10"),
        ]));
        let config = tool_config(5).with_human_in_loop(true);
        let mut agent = agent_with(provider, config).with_approval_gate(Arc::new(AutoApprove));

        let result = agent.execute("5+5", ExecuteOptions::new()).await.unwrap();
        assert_eq!(result.intermediate_steps[0].observation.as_deref(), Some("10"));
    }

    #[tokio::test]
    async fn events_are_published() {
        let bus = Arc::new(EventBus::default());
        let mut events = bus.subscribe();
        let provider = Arc::new(ScriptedProvider::texts(&[
            &react_action("add", "calculator", json!({"expression": "2+3"})),
            &react_final("5"),
        ]));
        let mut agent = agent_with(provider, tool_config(5)).with_event_bus(bus);

        agent.execute("2+3", ExecuteOptions::new()).await.unwrap();

        let mut tools_run = 0;
        let mut steps = 0;
        while let Ok(event) = events.try_recv() {
            match event.as_ref() {
                DomainEvent::ToolExecuted { success, .. } => {
                    assert!(*success);
                    tools_run += 1;
                }
                DomainEvent::StepRecorded { .. } => steps += 1,
                _ => {}
            }
        }
        assert_eq!((tools_run, steps), (1, 2));
    }

    #[tokio::test]
    async fn simple_agent_uses_keyword_parser() {
        let provider: Arc<dyn Provider> = Arc::new(ScriptedProvider::texts(&[
            "Let me think about it",
            "The final answer is 12",
        ]));
        let mut agent = ReactAgent::simple("quick", "mock-model", provider).unwrap();
        assert_eq!(agent.config().max_iterations, 5);

        let result = agent.execute("6+6", ExecuteOptions::new()).await.unwrap();

        assert!(result.success);
        assert_eq!(result.output, "The final answer is 12");
        assert_eq!(result.intermediate_steps.len(), 2);
    }

    #[test]
    fn context_condenses_prior_steps() {
        let steps = vec![ReactStep {
            step_number: 1,
            thought: "t".repeat(150),
            action: Some("calculator".into()),
            action_input: None,
            observation: Some("o".repeat(150)),
            is_final: false,
        }];
        let context = build_context("task", 2, 4, &steps);
        let lines: Vec<&str> = context.lines().collect();
        assert_eq!(lines[0], "**Task**: task");
        assert_eq!(lines[1], "**Iteration**: 2/4");
        assert_eq!(lines[2], "**Previous Steps**:");
        assert_eq!(lines[3], format!("- Step 1: {}...", "t".repeat(100)));
        assert_eq!(lines[4], format!("  Observation: {}...", "o".repeat(100)));
    }

    #[test]
    fn default_prompt_lists_tools() {
        let registry = aifoundation_tools::default_registry();
        let prompt = default_system_prompt("solver", &registry.list());
        assert!(prompt.starts_with("You are solver"));
        assert!(prompt.contains("- **calculator**: "));
        assert!(prompt.contains("(params: `expression`)"));
        assert!(default_system_prompt("x", &[]).contains("No tools available."));
    }

    #[test]
    fn plan_has_four_steps() {
        let provider: Arc<dyn Provider> = Arc::new(ScriptedProvider::new(vec![]));
        let agent = ReactAgent::simple("p", "m", provider).unwrap();
        let plan = agent.plan("sum numbers");
        assert_eq!(plan.len(), 4);
        assert_eq!(plan[0], "Analyze task: sum numbers");
    }
}
