//! Request boundary: one question in, a confirmation request or a full
//! debate report out.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use tribunal_core::{
    AgentId, DebateRecord, Domain, HeuristicAdvisor, PromptAdvisor, RoundOutput,
};

use crate::config::{ConfigError, RuntimeConfig};
use crate::engine::{DebateEngine, EngineError};
use crate::history::{DebateStore, HistoryError, JsonFileStore};
use crate::providers::ProviderRegistry;
use crate::router::DomainRouter;

const CONFIRMATION_EXPLANATION: &str =
    "Your original prompt was short, vague, or could lead to lower-quality AI answers.";
const CONFIRMATION_MESSAGE: &str = "Your prompt was improved. Approve?";

/// A debate request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebateRequest {
    pub question: String,

    /// Existing conversation to append to; a new id is generated if absent
    #[serde(default, alias = "chat_id")]
    pub conversation_id: Option<String>,

    /// Skip the advisor and debate `improved_prompt` (or the question)
    #[serde(default)]
    pub use_improved: bool,

    #[serde(default)]
    pub improved_prompt: Option<String>,
}

impl DebateRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }
}

/// Returned instead of a debate when the advisor rewrote the question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationPayload {
    pub domain: Domain,
    pub original_prompt: String,
    pub improved_prompt: String,
    pub improvement_reason: String,
    pub explanation: String,
    pub message: String,
}

/// Full transcript and verdict of a completed debate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateReport {
    pub conversation_id: String,
    pub domain: Domain,
    pub used_prompt: String,
    pub agents: Vec<AgentId>,
    pub initial: RoundOutput,
    pub critiques: RoundOutput,
    pub defenses: RoundOutput,
    pub winner: AgentId,
    pub scoreboard: BTreeMap<AgentId, f64>,

    /// The winner's initial answer
    pub answer: String,

    pub reason: String,
    pub judge_raw: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DebateResponse {
    NeedsConfirmation(ConfirmationPayload),
    Debated(DebateReport),
}

/// Errors from [`DebateService::handle`].
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The debate completed but could not be persisted.
    #[error("Debate finished but history was not saved: {source}")]
    HistoryNotSaved {
        report: Box<DebateReport>,
        #[source]
        source: HistoryError,
    },
}

/// Wires router, advisor, engine and store together.
pub struct DebateService {
    router: DomainRouter,
    engine: DebateEngine,
    advisor: Arc<dyn PromptAdvisor>,
    store: Arc<dyn DebateStore>,
}

impl DebateService {
    pub fn new(
        router: DomainRouter,
        engine: DebateEngine,
        advisor: Arc<dyn PromptAdvisor>,
        store: Arc<dyn DebateStore>,
    ) -> Self {
        Self {
            router,
            engine,
            advisor,
            store,
        }
    }

    /// Build the full stack from configuration: providers, router, engine,
    /// the heuristic advisor and a JSON file store under `history_dir`.
    pub fn from_config(config: &RuntimeConfig) -> Result<Self, ConfigError> {
        let registry = Arc::new(ProviderRegistry::from_config(config)?);
        let router = DomainRouter::new(config.routing.clone(), config.classifier.clone(), &registry)?;
        let engine = DebateEngine::new(Arc::clone(&registry), config.judge.clone()).map_err(|_| {
            ConfigError::UnknownProvider {
                role: "Judge",
                agent: config.judge.clone(),
            }
        })?;

        Ok(Self::new(
            router,
            engine,
            Arc::new(HeuristicAdvisor::new()),
            Arc::new(JsonFileStore::new(&config.history_dir)),
        ))
    }

    /// Replace the transcript store.
    pub fn with_store(mut self, store: Arc<dyn DebateStore>) -> Self {
        self.store = store;
        self
    }

    pub fn router(&self) -> &DomainRouter {
        &self.router
    }

    pub fn engine(&self) -> &DebateEngine {
        &self.engine
    }

    pub fn store(&self) -> &Arc<dyn DebateStore> {
        &self.store
    }

    /// Handle one request.
    ///
    /// Without `use_improved`, a question the advisor would rewrite is sent
    /// back for confirmation instead of being debated.
    pub async fn handle(&self, request: DebateRequest) -> Result<DebateResponse, ServiceError> {
        let (domain, agents) = self.router.route(&request.question).await;

        let used_prompt = if request.use_improved {
            request
                .improved_prompt
                .clone()
                .unwrap_or_else(|| request.question.clone())
        } else {
            let advice = self.advisor.improve(&request.question);
            if advice.changes(&request.question) {
                tracing::info!(domain = %domain, "Prompt rewrite proposed, awaiting confirmation");
                return Ok(DebateResponse::NeedsConfirmation(ConfirmationPayload {
                    domain,
                    original_prompt: request.question,
                    improved_prompt: advice.improved,
                    improvement_reason: advice.reason,
                    explanation: CONFIRMATION_EXPLANATION.to_string(),
                    message: CONFIRMATION_MESSAGE.to_string(),
                }));
            }
            request.question.clone()
        };

        let outcome = self.engine.run(&agents, &used_prompt).await?;

        let conversation_id = request
            .conversation_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let record = DebateRecord::from_outcome(used_prompt.as_str(), &outcome);

        let report = DebateReport {
            conversation_id: conversation_id.clone(),
            domain,
            used_prompt,
            answer: outcome.winning_answer().unwrap_or_default().to_string(),
            agents: outcome.agents,
            initial: outcome.initial,
            critiques: outcome.critiques,
            defenses: outcome.defenses,
            winner: outcome.verdict.winner,
            scoreboard: outcome.verdict.scoreboard,
            reason: outcome.verdict.reason,
            judge_raw: outcome.judge_raw,
        };

        if let Err(source) = self.store.append(&conversation_id, record).await {
            tracing::error!(conversation = %conversation_id, error = %source, "Failed to save history");
            return Err(ServiceError::HistoryNotSaved {
                report: Box::new(report),
                source,
            });
        }

        Ok(DebateResponse::Debated(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryStore;
    use crate::testing::{registry_of, ScriptedAgent};
    use tribunal_core::DomainTable;

    struct Harness {
        service: DebateService,
        store: Arc<MemoryStore>,
        debater: Arc<ScriptedAgent>,
    }

    fn harness(judge_reply: &str) -> Harness {
        let debater = ScriptedAgent::echo("A");
        let registry = Arc::new(registry_of(&[
            ("A", debater.clone()),
            ("B", ScriptedAgent::echo("B")),
            ("clf", ScriptedAgent::fixed("clf", "math")),
            ("J", ScriptedAgent::fixed("J", judge_reply)),
        ]));

        let mut table = DomainTable::new(Default::default());
        table.set(Domain::General, vec![AgentId::from("B")]);
        table.set(Domain::Math, vec![AgentId::from("A"), AgentId::from("B")]);

        let router = DomainRouter::new(table, AgentId::from("clf"), &registry).unwrap();
        let engine = DebateEngine::new(Arc::clone(&registry), AgentId::from("J")).unwrap();
        let store = Arc::new(MemoryStore::new());
        let service = DebateService::new(
            router,
            engine,
            Arc::new(HeuristicAdvisor::new()),
            store.clone(),
        );

        Harness {
            service,
            store,
            debater,
        }
    }

    #[tokio::test]
    async fn test_short_question_needs_confirmation() {
        let h = harness("{}");

        let response = h.service.handle(DebateRequest::new("integrate x^2")).await.unwrap();

        let DebateResponse::NeedsConfirmation(payload) = response else {
            panic!("expected a confirmation request");
        };
        assert_eq!(payload.domain, Domain::Math);
        assert_eq!(payload.original_prompt, "integrate x^2");
        assert_eq!(
            payload.improved_prompt,
            "Provide a detailed, well-structured explanation about: integrate x^2"
        );
        assert!(h.debater.prompts().is_empty());
        assert_eq!(h.store.conversation_count(), 0);
    }

    #[tokio::test]
    async fn test_long_question_is_debated_and_saved() {
        let h = harness(r#"{"winner": "B", "scoreboard": {"A": 5, "B": 8}, "reason": "more precise"}"#);
        let question = "What is the integral of x squared over zero to one?";

        let response = h.service.handle(DebateRequest::new(question)).await.unwrap();

        let DebateResponse::Debated(report) = response else {
            panic!("expected a debate report");
        };
        assert_eq!(report.domain, Domain::Math);
        assert_eq!(report.used_prompt, question);
        assert_eq!(report.agents, vec![AgentId::from("A"), AgentId::from("B")]);
        assert_eq!(report.winner.as_str(), "B");
        assert_eq!(report.answer, format!("B: {question}"));
        assert_eq!(report.reason, "more precise");
        assert!(uuid::Uuid::parse_str(&report.conversation_id).is_ok());

        let saved = h.store.load(&report.conversation_id).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].prompt, question);
        assert_eq!(saved[0].verdict.winner.as_str(), "B");
    }

    #[tokio::test]
    async fn test_use_improved_skips_advisor() {
        let h = harness("garbage");
        let request = DebateRequest {
            question: "gravity?".to_string(),
            conversation_id: Some("conv-7".to_string()),
            use_improved: true,
            improved_prompt: Some("Explain gravity in detail".to_string()),
        };

        let DebateResponse::Debated(report) = h.service.handle(request).await.unwrap() else {
            panic!("expected a debate report");
        };
        assert_eq!(report.conversation_id, "conv-7");
        assert_eq!(report.used_prompt, "Explain gravity in detail");
        assert_eq!(report.winner.as_str(), "A");
        assert_eq!(report.reason, "Judge fallback");
        assert_eq!(h.debater.prompts()[0], "Explain gravity in detail");
        assert_eq!(h.store.load("conv-7").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_use_improved_without_text_uses_question() {
        let h = harness("{}");
        let request = DebateRequest {
            question: "gravity?".to_string(),
            use_improved: true,
            ..Default::default()
        };

        let DebateResponse::Debated(report) = h.service.handle(request).await.unwrap() else {
            panic!("expected a debate report");
        };
        assert_eq!(report.used_prompt, "gravity?");
    }

    #[tokio::test]
    async fn test_history_failure_keeps_report() {
        let h = harness("{}");
        let request = DebateRequest {
            question: "q".to_string(),
            conversation_id: Some("../outside".to_string()),
            use_improved: true,
            improved_prompt: None,
        };

        match h.service.handle(request).await {
            Err(ServiceError::HistoryNotSaved { report, source }) => {
                assert_eq!(report.winner.as_str(), "A");
                assert!(matches!(source, HistoryError::InvalidConversationId(_)));
            }
            other => panic!("expected HistoryNotSaved, got {other:?}"),
        }
    }

    #[test]
    fn test_request_accepts_chat_id_alias() {
        let request: DebateRequest =
            serde_json::from_str(r#"{"question": "q", "chat_id": "c-1"}"#).unwrap();
        assert_eq!(request.conversation_id.as_deref(), Some("c-1"));
        assert!(!request.use_improved);
    }

    #[test]
    fn test_response_status_tag() {
        let response = DebateResponse::NeedsConfirmation(ConfirmationPayload {
            domain: Domain::Physics,
            original_prompt: "a".to_string(),
            improved_prompt: "b".to_string(),
            improvement_reason: "c".to_string(),
            explanation: CONFIRMATION_EXPLANATION.to_string(),
            message: CONFIRMATION_MESSAGE.to_string(),
        });

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "needs_confirmation");
        assert_eq!(value["domain"], "physics");
        assert_eq!(value["message"], "Your prompt was improved. Approve?");
    }
}
