//! The closed set of agent variants.

use aifoundation_core::agent::{AgentConfig, AgentInfo, AgentResult, AgentType};
use aifoundation_core::error::Error;
use aifoundation_core::tool::ToolDispatch;
use std::sync::Arc;

use crate::binding::ProviderBinding;
use crate::context::ContextManager;
use crate::options::ExecuteOptions;
use crate::patterns::{ConversationalAgent, ReactAgent};

/// What an agent needs besides its configuration.
pub struct AgentDeps {
    pub binding: ProviderBinding,
    pub tools: Arc<dyn ToolDispatch>,
    pub context: ContextManager,
}

pub enum Agent {
    React(ReactAgent),
    Conversational(ConversationalAgent),
}

impl Agent {
    /// Build the variant named by `config.agent_type`.
    ///
    /// `tool` agents run the ReAct loop. Planning and multi-agent
    /// configurations are rejected.
    pub fn from_config(config: AgentConfig, deps: AgentDeps) -> Result<Self, Error> {
        match config.agent_type {
            AgentType::React | AgentType::Tool => {
                ReactAgent::new(config, deps.binding, deps.tools).map(Agent::React)
            }
            AgentType::Conversational => {
                ConversationalAgent::new(config, deps.binding, deps.context)
                    .map(Agent::Conversational)
            }
            other => Err(Error::config(format!("unsupported agent type: {other}"))),
        }
    }

    pub async fn execute(
        &mut self,
        task: &str,
        options: ExecuteOptions,
    ) -> Result<AgentResult, Error> {
        match self {
            Agent::React(agent) => agent.execute(task, options).await,
            Agent::Conversational(agent) => agent.execute(task, options).await,
        }
    }

    pub fn plan(&self, task: &str) -> Vec<String> {
        match self {
            Agent::React(agent) => agent.plan(task),
            Agent::Conversational(agent) => agent.plan(task),
        }
    }

    pub fn evaluate(&self, result: &AgentResult) -> bool {
        match self {
            Agent::React(agent) => agent.evaluate(result),
            Agent::Conversational(agent) => agent.evaluate(result),
        }
    }

    pub fn info(&self) -> AgentInfo {
        match self {
            Agent::React(agent) => agent.info(),
            Agent::Conversational(agent) => agent.info(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Agent::React(agent) => &agent.config().name,
            Agent::Conversational(agent) => &agent.config().name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::test_helpers::ScriptedProvider;
    use aifoundation_config::ContextConfig;
    use aifoundation_memory::InMemoryContextStore;

    fn deps(provider: Arc<ScriptedProvider>) -> AgentDeps {
        AgentDeps {
            binding: ProviderBinding::fixed(provider),
            tools: Arc::new(aifoundation_tools::default_registry()),
            context: ContextManager::new(
                Arc::new(InMemoryContextStore::new()),
                ContextConfig::default(),
            ),
        }
    }

    #[test]
    fn tool_agents_run_react() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let agent =
            Agent::from_config(AgentConfig::new("t", AgentType::Tool), deps(provider)).unwrap();
        assert!(matches!(agent, Agent::React(_)));
        assert_eq!(agent.name(), "t");
        assert_eq!(agent.plan("x")[0], "Analyze task: x");
    }

    #[test]
    fn planning_agents_are_rejected() {
        for kind in [AgentType::Planning, AgentType::MultiAgent] {
            let provider = Arc::new(ScriptedProvider::new(vec![]));
            let err = Agent::from_config(AgentConfig::new("p", kind), deps(provider))
                .err()
                .unwrap();
            assert!(err.is_configuration());
            assert!(err.to_string().contains(kind.as_str()));
        }
    }

    #[tokio::test]
    async fn conversational_variant_delegates() {
        let provider = Arc::new(ScriptedProvider::texts(&["hello there"]));
        let config = AgentConfig::new("c", AgentType::Conversational).with_model("mock-model");
        let mut agent = Agent::from_config(config, deps(provider)).unwrap();

        let result = agent.execute("hi", ExecuteOptions::new()).await.unwrap();
        assert!(agent.evaluate(&result));
        assert_eq!(agent.info().agent_type, AgentType::Conversational);
        assert_eq!(agent.info().history_length, 0);
    }
}
