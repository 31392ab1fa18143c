//! Domain classification and agent selection.

use std::sync::Arc;

use tribunal_core::prompts::classification_prompt;
use tribunal_core::{AgentId, Domain, DomainTable};

use crate::config::ConfigError;
use crate::providers::{Agent, ProviderRegistry};

/// Picks the agents for a question.
///
/// The classifier's answer is normalized; anything that is not one of the
/// five labels (an offline answer included) routes to `general`.
pub struct DomainRouter {
    table: DomainTable,
    classifier_id: AgentId,
    classifier: Arc<dyn Agent>,
}

impl std::fmt::Debug for DomainRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainRouter")
            .field("table", &self.table)
            .field("classifier", &self.classifier_id)
            .finish()
    }
}

impl DomainRouter {
    /// Validate `table` against `registry` and bind the classifier agent.
    pub fn new(
        table: DomainTable,
        classifier: AgentId,
        registry: &ProviderRegistry,
    ) -> Result<Self, ConfigError> {
        table.validate(|id| registry.contains(id.as_str()))?;

        let agent = registry
            .get(classifier.as_str())
            .cloned()
            .ok_or_else(|| ConfigError::UnknownProvider {
                role: "Classifier",
                agent: classifier.clone(),
            })?;

        Ok(Self {
            table,
            classifier_id: classifier,
            classifier: agent,
        })
    }

    /// Ask the classifier which domain `question` belongs to.
    pub async fn classify(&self, question: &str) -> Domain {
        let answer = self.classifier.ask(&classification_prompt(question), None).await;
        let domain = Domain::from_label(&answer);

        tracing::debug!(
            classifier = %self.classifier_id,
            domain = %domain,
            "Classified question"
        );
        domain
    }

    /// Ordered agent list for `domain`.
    pub fn select_agents(&self, domain: Domain) -> &[AgentId] {
        self.table.select_agents(domain)
    }

    /// Classify, then select.
    pub async fn route(&self, question: &str) -> (Domain, Vec<AgentId>) {
        let domain = self.classify(question).await;
        (domain, self.select_agents(domain).to_vec())
    }

    pub fn table(&self) -> &DomainTable {
        &self.table
    }
}
