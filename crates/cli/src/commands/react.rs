//! `foundation react`: Solve one task with the ReAct agent.

use aifoundation_agent::{
    ApprovalDecision, ApprovalGate, ExecuteOptions, ReactAgent, ToolReviewRequest,
};
use aifoundation_config::AppConfig;
use aifoundation_core::agent::{AgentResult, AgentType};
use async_trait::async_trait;
use std::io::Write;
use std::sync::Arc;

use super::{agent_config, registry};

pub async fn run(
    config: &AppConfig,
    message: &str,
    model: Option<String>,
    max_iterations: Option<u32>,
) -> anyhow::Result<()> {
    let providers = registry(config)?;
    let tools = aifoundation_tools::default_registry();

    let mut agent_config = agent_config(config, AgentType::React, model).with_tools(tools.list());
    if let Some(max) = max_iterations {
        agent_config = agent_config.with_max_iterations(max);
    }

    let mut agent = ReactAgent::new(agent_config, providers, Arc::new(tools))?;
    if config.human_in_loop.enabled {
        agent = agent.with_approval_gate(Arc::new(PromptApproval));
    }

    eprint!("  Thinking...");
    let result = agent.execute(message, ExecuteOptions::new()).await?;
    eprint!("\r              \r");

    print_trace(&result);
    if !result.success {
        anyhow::bail!(result.error.unwrap_or_else(|| "agent failed".into()));
    }
    Ok(())
}

fn print_trace(result: &AgentResult) {
    for step in &result.intermediate_steps {
        println!("  Step {}", step.step);
        println!("    Thought:     {}", step.thought);
        if let Some(action) = &step.action {
            println!("    Action:      {action}");
        }
        if let Some(observation) = &step.observation {
            println!("    Observation: {observation}");
        }
    }
    println!();
    println!("{}", result.output);
    println!();
    println!("  ({} steps, ~{} tokens)", result.intermediate_steps.len(), result.tokens_used);
}

/// Asks on the terminal before every tool call.
struct PromptApproval;

#[async_trait]
impl ApprovalGate for PromptApproval {
    async fn review(&self, request: ToolReviewRequest) -> ApprovalDecision {
        let arguments = serde_json::Value::Object(request.arguments).to_string();
        let prompt = format!("  Run {} {arguments}? [y/N] ", request.tool);

        let answer = tokio::task::spawn_blocking(move || {
            eprint!("{prompt}");
            let _ = std::io::stderr().flush();
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| line)
        })
        .await;

        match answer {
            Ok(Ok(line)) if line.trim().eq_ignore_ascii_case("y") => ApprovalDecision::Approve,
            _ => ApprovalDecision::Reject {
                reason: "declined at the terminal".into(),
            },
        }
    }
}
