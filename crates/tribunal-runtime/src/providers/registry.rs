//! Named collection of agents, built once at startup.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tribunal_core::AgentId;

use super::{Agent, Provider};
use crate::config::{ConfigError, RuntimeConfig};

/// Registry of debate agents keyed by id.
///
/// Read-only once built; share it behind an `Arc`.
#[derive(Default)]
pub struct ProviderRegistry {
    agents: BTreeMap<AgentId, Arc<dyn Agent>>,
}

impl ProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one [`Provider`] per configured agent, all sharing a single
    /// HTTP connection pool.
    pub fn from_config(config: &RuntimeConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        let mut registry = Self::new();
        for agent in &config.agents {
            let provider = Provider::new(
                agent.provider_config(),
                client.clone(),
                config.request_timeout,
            );

            tracing::debug!(
                agent = %agent.id,
                backend = %agent.backend,
                model = %agent.model,
                online = provider.is_online(),
                "Registered agent"
            );
            registry.register(agent.id.clone(), Arc::new(provider));
        }

        Ok(registry)
    }

    /// Register an agent. An existing agent with the same id is replaced.
    pub fn register(&mut self, id: impl Into<AgentId>, agent: Arc<dyn Agent>) {
        self.agents.insert(id.into(), agent);
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Agent>> {
        self.agents.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.agents.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn agent_ids(&self) -> impl Iterator<Item = &AgentId> {
        self.agents.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AgentId, &Arc<dyn Agent>)> {
        self.agents.iter()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("agents", &self.agents.keys().collect::<Vec<_>>())
            .finish()
    }
}
