//! Multi-turn conversational agent.
//!
//! One provider call per turn. History lives in a [`ContextManager`] keyed
//! by conversation id, so several agents (or processes sharing a store) can
//! continue the same conversation.

use aifoundation_core::agent::{AgentConfig, AgentInfo, AgentResult};
use aifoundation_core::error::Error;
use aifoundation_core::event::{DomainEvent, EventBus};
use aifoundation_core::message::{ConversationId, Message, Role};
use aifoundation_core::provider::{ProviderRequest, ProviderResponse};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::binding::{BoundProvider, ProviderBinding};
use crate::context::ContextManager;
use crate::options::ExecuteOptions;

const SUMMARY_PROMPT: &str = "Summarize this conversation concisely in 200 words or less.";
const SUMMARY_MAX_TOKENS: u32 = 300;
/// Non-system messages fed to the summarizer.
const SUMMARY_SOURCE_MESSAGES: usize = 10;

pub struct ConversationalAgent {
    config: AgentConfig,
    binding: ProviderBinding,
    context: ContextManager,
    event_bus: Option<Arc<EventBus>>,
    /// History length seen by the last call, for `info()`.
    history_len: usize,
}

impl ConversationalAgent {
    pub fn new(
        config: AgentConfig,
        binding: impl Into<ProviderBinding>,
        context: ContextManager,
    ) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            config,
            binding: binding.into(),
            context,
            event_bus: None,
            history_len: 0,
        })
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn context(&self) -> &ContextManager {
        &self.context
    }

    /// Answer one user turn.
    ///
    /// Only model resolution errors are returned as `Err`; storage and
    /// provider failures come back as a failed [`AgentResult`].
    pub async fn execute(
        &mut self,
        task: &str,
        options: ExecuteOptions,
    ) -> Result<AgentResult, Error> {
        let bound = self.binding.bind(&self.config.model)?;
        let conversation = options.conversation_or(&self.config.name);

        match self.turn(task, &bound, &conversation).await {
            Ok(response) => Ok(AgentResult {
                tokens_used: u64::from(response.usage.total_tokens),
                ..AgentResult::succeeded(response.content)
            }),
            Err(e) => {
                warn!(agent = %self.config.name, conversation = %conversation, error = %e, "Conversation turn failed");
                Ok(AgentResult::failed("", e.to_string()))
            }
        }
    }

    async fn turn(
        &mut self,
        task: &str,
        bound: &BoundProvider,
        conversation: &ConversationId,
    ) -> Result<ProviderResponse, Error> {
        let history = self.context.get_messages(conversation).await?;
        self.history_len = history.len();

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(self.system_prompt()));
        messages.extend(history.iter().cloned());
        messages.push(Message::user(task));

        let per_message = self.context.config().max_tokens_per_message;
        let tokens = self.context.calculate_tokens(&messages);
        if tokens > per_message * 3 {
            debug!(tokens, limit = per_message * 2, "Truncating conversation context");
            messages = self.context.truncate_context(messages, per_message * 2);
        }

        let mut request = ProviderRequest::new(bound.model.clone(), messages);
        request.temperature = self.config.temperature;
        request.max_tokens = self.config.max_tokens;

        let response = bound.provider.generate(request).await?;
        self.publish(DomainEvent::ResponseGenerated {
            conversation_id: conversation.to_string(),
            model: response.model.clone(),
            tokens_used: response.usage.total_tokens,
            timestamp: Utc::now(),
        });

        self.context
            .add_message(conversation, Message::user(task))
            .await?;
        self.context
            .add_message(conversation, Message::assistant(response.content.clone()))
            .await?;

        let settings = self.context.config();
        if settings.enable_summarization && history.len() > settings.summarization_threshold {
            self.condense(bound, conversation).await?;
        }

        Ok(response)
    }

    /// Replace the stored history with a single summary message.
    async fn condense(
        &mut self,
        bound: &BoundProvider,
        conversation: &ConversationId,
    ) -> Result<(), Error> {
        let Some(summary) = self.summarize(bound, conversation).await? else {
            info!(conversation = %conversation, "Summary unavailable, keeping history");
            return Ok(());
        };

        let replaced = self.context.get_messages(conversation).await?.len();
        self.context.clear_context(conversation).await?;
        self.context
            .add_message(
                conversation,
                Message::system(format!("Conversation Summary: {summary}")),
            )
            .await?;
        self.history_len = 1;

        info!(conversation = %conversation, replaced, "Conversation summarized");
        self.publish(DomainEvent::HistorySummarized {
            conversation_id: conversation.to_string(),
            replaced_messages: replaced,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// `None` when the provider could not produce a summary.
    async fn summarize(
        &self,
        bound: &BoundProvider,
        conversation: &ConversationId,
    ) -> Result<Option<String>, Error> {
        let messages = self.context.get_messages(conversation).await?;
        let text = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .take(SUMMARY_SOURCE_MESSAGES)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let mut request = ProviderRequest::new(
            bound.model.clone(),
            vec![Message::system(SUMMARY_PROMPT), Message::user(text)],
        );
        request.max_tokens = Some(SUMMARY_MAX_TOKENS);

        match bound.provider.generate(request).await {
            Ok(response) => Ok(Some(response.content)),
            Err(e) => {
                warn!(conversation = %conversation, error = %e, "Summarization failed");
                Ok(None)
            }
        }
    }

    pub async fn clear_conversation(&mut self, id: &ConversationId) -> Result<(), Error> {
        self.context.clear_context(id).await?;
        self.history_len = 0;
        Ok(())
    }

    pub fn plan(&self, task: &str) -> Vec<String> {
        vec![
            format!("Understand the user's intent: {task}"),
            "Retrieve relevant context".to_string(),
            "Formulate response".to_string(),
            "Consider follow-up topics".to_string(),
        ]
    }

    pub fn evaluate(&self, result: &AgentResult) -> bool {
        result.success && !result.output.is_empty()
    }

    pub fn info(&self) -> AgentInfo {
        AgentInfo {
            name: self.config.name.clone(),
            agent_type: self.config.agent_type,
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            tools_count: self.config.tools.len(),
            history_length: self.history_len,
        }
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }

    fn system_prompt(&self) -> String {
        if !self.config.system_prompt.trim().is_empty() {
            return self.config.system_prompt.clone();
        }
        format!(
            r#"You are {name}, a helpful and friendly AI assistant.

## Your Characteristics
- You engage in natural, conversational dialogue
- You remember context from the conversation
- You provide clear and helpful responses
- You ask clarifying questions when needed
- You are honest about limitations

## Guidelines
- Be conversational but professional
- Keep responses concise and relevant
- Remember important details from the conversation
- Adapt your communication style to the user"#,
            name = self.config.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::test_helpers::*;
    use aifoundation_config::ContextConfig;
    use aifoundation_core::agent::AgentType;
    use aifoundation_core::error::ProviderError;
    use aifoundation_memory::InMemoryContextStore;

    fn context(config: ContextConfig) -> ContextManager {
        ContextManager::new(Arc::new(InMemoryContextStore::new()), config)
    }

    fn agent(provider: Arc<ScriptedProvider>, ctx: ContextManager) -> ConversationalAgent {
        let config = AgentConfig::new("buddy", AgentType::Conversational).with_model("mock-model");
        ConversationalAgent::new(config, ProviderBinding::fixed(provider), ctx).unwrap()
    }

    #[tokio::test]
    async fn turns_are_remembered() {
        let provider = Arc::new(ScriptedProvider::texts(&["Hi Ana!", "Your name is Ana."]));
        let mut agent = agent(provider.clone(), context(ContextConfig::default()));

        let first = agent.execute("I'm Ana", ExecuteOptions::new()).await.unwrap();
        assert!(first.success);
        assert_eq!(first.output, "Hi Ana!");
        assert_eq!(first.tokens_used, 15);

        agent.execute("What's my name?", ExecuteOptions::new()).await.unwrap();

        let second = &provider.requests()[1];
        let contents: Vec<&str> = second.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(&contents[1..], &["I'm Ana", "Hi Ana!", "What's my name?"]);
        assert!(contents[0].starts_with("You are buddy"));
        assert_eq!(agent.info().history_length, 2);
    }

    #[tokio::test]
    async fn conversations_are_isolated() {
        let provider = Arc::new(ScriptedProvider::repeating("ok"));
        let ctx = context(ContextConfig::default());
        let mut agent = agent(provider, ctx.clone());

        let a = ExecuteOptions::new().with_conversation(ConversationId::from("a"));
        agent.execute("one", a).await.unwrap();
        agent.execute("two", ExecuteOptions::new()).await.unwrap();

        assert_eq!(ctx.get_messages(&"a".into()).await.unwrap().len(), 2);
        assert_eq!(ctx.get_messages(&"buddy".into()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn oversized_context_is_truncated() {
        let provider = Arc::new(ScriptedProvider::repeating("ok"));
        let ctx = context(ContextConfig {
            max_tokens_per_message: 20,
            ..ContextConfig::default()
        });
        let id = ConversationId::from("buddy");
        for i in 0..10 {
            ctx.add_message(&id, Message::user(format!("{i}{}", "x".repeat(40))))
                .await
                .unwrap();
        }
        let config = AgentConfig::new("buddy", AgentType::Conversational)
            .with_model("mock-model")
            .with_system_prompt("be brief");
        let mut agent =
            ConversationalAgent::new(config, ProviderBinding::fixed(provider.clone()), ctx.clone())
                .unwrap();

        agent.execute("latest", ExecuteOptions::new()).await.unwrap();

        let sent = &provider.requests()[0].messages;
        assert!(ctx.calculate_tokens(sent) <= 40);
        assert_eq!(sent[0].content, "be brief");
        assert_eq!(sent.len(), 3);
        assert_eq!(sent.last().unwrap().content, "latest");
    }

    #[tokio::test]
    async fn long_history_is_summarized() {
        let provider = Arc::new(ScriptedProvider::texts(&["reply", "they chatted"]));
        let ctx = context(ContextConfig {
            summarization_threshold: 2,
            ..ContextConfig::default()
        });
        let id = ConversationId::from("buddy");
        for i in 0..3 {
            ctx.add_message(&id, Message::user(format!("m{i}"))).await.unwrap();
        }
        let bus = Arc::new(EventBus::default());
        let mut events = bus.subscribe();
        let mut agent = agent(provider.clone(), ctx.clone()).with_event_bus(bus);

        let result = agent.execute("next", ExecuteOptions::new()).await.unwrap();
        assert_eq!(result.output, "reply");

        let summary_request = &provider.requests()[1];
        assert_eq!(summary_request.max_tokens, Some(300));
        assert_eq!(summary_request.messages[1].content, "m0\nm1\nm2\nnext\nreply");

        let stored = ctx.get_messages(&id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].role, Role::System);
        assert_eq!(stored[0].content, "Conversation Summary: they chatted");

        let mut summarized = false;
        while let Ok(event) = events.try_recv() {
            if let DomainEvent::HistorySummarized { replaced_messages, .. } = event.as_ref() {
                assert_eq!(*replaced_messages, 5);
                summarized = true;
            }
        }
        assert!(summarized);
    }

    #[tokio::test]
    async fn summary_failure_keeps_history() {
        let provider = Arc::new(ScriptedProvider::from_results(vec![
            Ok(make_text_response("reply")),
            Err(ProviderError::Timeout("slow".into())),
        ]));
        let ctx = context(ContextConfig {
            summarization_threshold: 0,
            ..ContextConfig::default()
        });
        let id = ConversationId::from("buddy");
        ctx.add_message(&id, Message::user("earlier")).await.unwrap();
        let mut agent = agent(provider, ctx.clone());

        let result = agent.execute("now", ExecuteOptions::new()).await.unwrap();
        assert!(result.success);
        assert_eq!(ctx.get_messages(&id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn provider_failure_is_a_failed_result() {
        let provider = Arc::new(ScriptedProvider::from_results(vec![Err(
            ProviderError::AuthenticationFailed("bad key".into()),
        )]));
        let ctx = context(ContextConfig::default());
        let mut agent = agent(provider, ctx.clone());

        let result = agent.execute("hello", ExecuteOptions::new()).await.unwrap();
        assert!(!result.success);
        assert!(result.error.as_ref().unwrap().contains("bad key"));
        assert!(!agent.evaluate(&result));
        // Nothing is persisted for a failed turn.
        assert!(ctx.get_messages(&"buddy".into()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_conversation_forgets() {
        let provider = Arc::new(ScriptedProvider::repeating("ok"));
        let ctx = context(ContextConfig::default());
        let mut agent = agent(provider, ctx.clone());
        agent.execute("hi", ExecuteOptions::new()).await.unwrap();

        agent.clear_conversation(&"buddy".into()).await.unwrap();
        assert!(ctx.get_messages(&"buddy".into()).await.unwrap().is_empty());
        assert_eq!(agent.info().history_length, 0);
    }

    #[test]
    fn plan_and_evaluate() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let agent = agent(provider, context(ContextConfig::default()));
        assert_eq!(agent.plan("greet")[0], "Understand the user's intent: greet");
        assert!(agent.evaluate(&AgentResult::succeeded("hi")));
        assert!(!agent.evaluate(&AgentResult::succeeded("")));
    }
}
