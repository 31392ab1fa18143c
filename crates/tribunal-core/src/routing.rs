//! Domain → agent routing table.
//!
//! The table is fixed at startup. List order matters: it is the iteration
//! order for every round and the tie-break order when the judge fails.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::types::{AgentId, Domain};

/// Errors from routing table validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutingError {
    #[error("Routing table has no '{}' entry", Domain::General)]
    MissingGeneral,

    #[error("Routing table lists no agents for domain '{0}'")]
    EmptyAgentList(Domain),

    #[error("Domain '{domain}' references unknown agent '{agent}'")]
    UnknownAgent { domain: Domain, agent: AgentId },

    #[error("Domain '{domain}' lists agent '{agent}' more than once")]
    DuplicateAgent { domain: Domain, agent: AgentId },
}

/// Mapping from domain to the ordered list of participating agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainTable {
    routes: BTreeMap<Domain, Vec<AgentId>>,
}

impl DomainTable {
    pub fn new(routes: BTreeMap<Domain, Vec<AgentId>>) -> Self {
        Self { routes }
    }

    /// Agents for `domain`, or the `general` list when the domain has no
    /// entry of its own.
    pub fn select_agents(&self, domain: Domain) -> &[AgentId] {
        self.routes
            .get(&domain)
            .or_else(|| self.routes.get(&Domain::General))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Agents for a free-form label. Unknown labels get the `general` list.
    pub fn select_agents_for_label(&self, label: &str) -> &[AgentId] {
        match Domain::parse_label(label) {
            Some(domain) => self.select_agents(domain),
            None => self.select_agents(Domain::General),
        }
    }

    /// Replace the list for one domain.
    pub fn set(&mut self, domain: Domain, agents: Vec<AgentId>) {
        self.routes.insert(domain, agents);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Domain, &[AgentId])> {
        self.routes.iter().map(|(d, agents)| (*d, agents.as_slice()))
    }

    /// Every agent referenced anywhere in the table, deduplicated.
    pub fn referenced_agents(&self) -> Vec<&AgentId> {
        let mut seen: Vec<&AgentId> = Vec::new();
        for agents in self.routes.values() {
            for agent in agents {
                if !seen.contains(&agent) {
                    seen.push(agent);
                }
            }
        }
        seen
    }

    /// Check structure and that every referenced agent is registered and
    /// listed at most once per domain.
    pub fn validate(&self, is_registered: impl Fn(&AgentId) -> bool) -> Result<(), RoutingError> {
        if !self.routes.contains_key(&Domain::General) {
            return Err(RoutingError::MissingGeneral);
        }

        for (domain, agents) in &self.routes {
            if agents.is_empty() {
                return Err(RoutingError::EmptyAgentList(*domain));
            }

            if let Some(agent) = agents.iter().find(|a| !is_registered(a)) {
                return Err(RoutingError::UnknownAgent {
                    domain: *domain,
                    agent: agent.clone(),
                });
            }

            let mut seen = BTreeSet::new();
            if let Some(agent) = agents.iter().find(|a| !seen.insert(*a)) {
                return Err(RoutingError::DuplicateAgent {
                    domain: *domain,
                    agent: agent.clone(),
                });
            }
        }

        Ok(())
    }
}

impl Default for DomainTable {
    /// The reference routing of the four stock agents.
    fn default() -> Self {
        let ids = |list: &[&str]| list.iter().map(|s| AgentId::from(*s)).collect::<Vec<_>>();

        let mut routes = BTreeMap::new();
        routes.insert(
            Domain::Coding,
            ids(&["gpt4_coder", "deepseek_chat", "groq_llama", "gemini_flash"]),
        );
        routes.insert(
            Domain::Mechanical,
            ids(&["groq_llama", "gpt4_coder", "gemini_flash"]),
        );
        routes.insert(
            Domain::Math,
            ids(&["deepseek_chat", "gpt4_coder", "groq_llama"]),
        );
        routes.insert(
            Domain::Physics,
            ids(&["groq_llama", "gpt4_coder", "gemini_flash"]),
        );
        routes.insert(
            Domain::General,
            ids(&["gpt4_coder", "groq_llama", "gemini_flash", "deepseek_chat"]),
        );

        Self { routes }
    }
}
