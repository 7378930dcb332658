//! `foundation chat`: Single-message or interactive conversation.

use aifoundation_agent::{BoundProvider, ContextManager, ConversationalAgent, ExecuteOptions};
use aifoundation_config::AppConfig;
use aifoundation_core::agent::AgentType;
use aifoundation_core::message::{ConversationId, Message};
use aifoundation_core::provider::ProviderRequest;
use aifoundation_memory::InMemoryContextStore;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{agent_config, registry};

pub async fn run(
    config: &AppConfig,
    message: Option<String>,
    model: Option<String>,
    stream: bool,
) -> anyhow::Result<()> {
    let providers = registry(config)?;
    let agent_config = agent_config(config, AgentType::Conversational, model);
    let conversation = ConversationId::from(agent_config.name.as_str());
    let context = ContextManager::new(
        Arc::new(InMemoryContextStore::new()),
        config.context.clone(),
    );

    let model_name = agent_config.model.clone();
    let mut session = if stream {
        let resolved = providers.provider_for_model(&agent_config.model)?;
        Session::Streaming {
            bound: BoundProvider {
                provider: resolved.provider,
                model: resolved.model,
            },
            context,
            conversation,
            system_prompt: agent_config.system_prompt.clone(),
        }
    } else {
        Session::Agent(ConversationalAgent::new(agent_config, providers, context)?)
    };

    if let Some(msg) = message {
        session.turn(&msg).await?;
        return Ok(());
    }

    println!();
    println!("  Model:     {model_name}");
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        if let Err(e) = session.turn(line).await {
            eprintln!("  [Error] {e}");
        }
        println!();
    }

    println!();
    println!("  Goodbye!");
    Ok(())
}

enum Session {
    Agent(ConversationalAgent),
    /// Streams the reply straight to stdout, keeping history in the same
    /// context manager the agent would use.
    Streaming {
        bound: BoundProvider,
        context: ContextManager,
        conversation: ConversationId,
        system_prompt: String,
    },
}

impl Session {
    async fn turn(&mut self, input: &str) -> anyhow::Result<()> {
        match self {
            Session::Agent(agent) => {
                let result = agent.execute(input, ExecuteOptions::new()).await?;
                if !result.success {
                    anyhow::bail!(result.error.unwrap_or_else(|| "no reply".into()));
                }
                for line in result.output.lines() {
                    println!("  Assistant > {line}");
                }
            }
            Session::Streaming {
                bound,
                context,
                conversation,
                system_prompt,
            } => {
                let mut messages = Vec::new();
                if !system_prompt.is_empty() {
                    messages.push(Message::system(system_prompt.clone()));
                }
                messages.extend(context.get_messages(conversation).await?);
                messages.push(Message::user(input));

                let mut request = ProviderRequest::new(bound.model.clone(), messages);
                request.stream = true;
                let mut chunks = bound.provider.stream_generate(request).await?;

                let mut reply = String::new();
                print!("  Assistant > ");
                while let Some(chunk) = chunks.recv().await {
                    let chunk = chunk?;
                    if let Some(text) = chunk.content {
                        print!("{text}");
                        std::io::stdout().flush()?;
                        reply.push_str(&text);
                    }
                    if chunk.done {
                        break;
                    }
                }
                println!();

                context.add_message(conversation, Message::user(input)).await?;
                context.add_message(conversation, Message::assistant(reply)).await?;
            }
        }
        Ok(())
    }
}
