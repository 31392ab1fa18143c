//! Four-phase debate engine.
//!
//! The engine drives a fixed agent list through initial answers, critique,
//! defense and judging:
//! - Phases run strictly in order; each sees the complete previous round
//! - Inside a phase every agent is asked concurrently, joined in list order
//! - Judge output goes through the [`VerdictParser`], so a run never fails
//!   once its agents have been resolved

use futures::future::join_all;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use tribunal_core::prompts::{critique_prompt, defense_prompt, judge_prompt};
use tribunal_core::{AgentId, DebateOutcome, Phase, RoundOutput, VerdictParser};

use crate::providers::{Agent, ProviderRegistry};

/// Errors from the debate engine. All of them are raised before any agent
/// is asked anything.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("No agents selected for the debate")]
    NoAgents,

    #[error("Agent '{0}' is not registered")]
    UnknownAgent(AgentId),

    #[error("Agent '{0}' is selected more than once")]
    DuplicateAgent(AgentId),
}

/// Runs debates against a shared registry.
pub struct DebateEngine {
    registry: Arc<ProviderRegistry>,
    judge_id: AgentId,
    judge: Arc<dyn Agent>,
    parser: VerdictParser,
}

impl std::fmt::Debug for DebateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebateEngine")
            .field("registry", &self.registry)
            .field("judge", &self.judge_id)
            .finish()
    }
}

impl DebateEngine {
    /// Bind the engine to `registry` with `judge` as the fixed judge agent.
    pub fn new(registry: Arc<ProviderRegistry>, judge: AgentId) -> Result<Self, EngineError> {
        let judge_agent = registry
            .get(judge.as_str())
            .cloned()
            .ok_or_else(|| EngineError::UnknownAgent(judge.clone()))?;

        Ok(Self {
            registry,
            judge_id: judge,
            judge: judge_agent,
            parser: VerdictParser::new(),
        })
    }

    pub fn judge(&self) -> &AgentId {
        &self.judge_id
    }

    /// Run all four phases over `agents` for `prompt`.
    ///
    /// # Errors
    /// Returns [`EngineError`] if `agents` is empty or names an unregistered
    /// agent. No agent is called in that case.
    pub async fn run(&self, agents: &[AgentId], prompt: &str) -> Result<DebateOutcome, EngineError> {
        let participants = self.resolve(agents)?;

        tracing::info!(agents = participants.len(), judge = %self.judge_id, "Debate started");

        let initial = run_round(Phase::Initial, &participants, |_, agent| async move {
            agent.ask(prompt, None).await
        })
        .await;

        let critique = critique_prompt(&initial);
        let critiques = run_round(Phase::Critique, &participants, |_, agent| {
            let critique = critique.as_str();
            async move { agent.ask(critique, None).await }
        })
        .await;

        let defenses = run_round(Phase::Defense, &participants, |id, agent| {
            let prompt = defense_prompt(initial.get(id.as_str()).unwrap_or_default(), &critiques);
            async move { agent.ask(&prompt, None).await }
        })
        .await;

        tracing::debug!(phase = %Phase::Judge, agent = %self.judge_id, "Asking judge");
        let judge_raw = self
            .judge
            .ask(&judge_prompt(&initial, &critiques, &defenses), None)
            .await;
        let (verdict, fell_back) = self.parser.parse_with_status(&judge_raw, &initial);

        tracing::info!(
            winner = %verdict.winner,
            fallback = fell_back,
            "Debate finished"
        );

        Ok(DebateOutcome {
            agents: agents.to_vec(),
            initial,
            critiques,
            defenses,
            verdict,
            judge_raw,
        })
    }

    fn resolve<'a>(
        &self,
        agents: &'a [AgentId],
    ) -> Result<Vec<(&'a AgentId, Arc<dyn Agent>)>, EngineError> {
        if agents.is_empty() {
            return Err(EngineError::NoAgents);
        }

        let mut seen = BTreeSet::new();
        if let Some(id) = agents.iter().find(|id| !seen.insert(*id)) {
            return Err(EngineError::DuplicateAgent(id.clone()));
        }

        agents
            .iter()
            .map(|id| {
                self.registry
                    .get(id.as_str())
                    .map(|agent| (id, Arc::clone(agent)))
                    .ok_or_else(|| EngineError::UnknownAgent(id.clone()))
            })
            .collect()
    }
}

/// Ask every participant concurrently and collect answers in list order.
async fn run_round<'a, F, Fut>(
    phase: Phase,
    participants: &'a [(&'a AgentId, Arc<dyn Agent>)],
    ask: F,
) -> RoundOutput
where
    F: Fn(&'a AgentId, &'a dyn Agent) -> Fut,
    Fut: Future<Output = String> + 'a,
{
    tracing::debug!(phase = %phase, agents = participants.len(), "Round started");

    let answers = join_all(
        participants
            .iter()
            .map(|(id, agent)| ask(*id, agent.as_ref())),
    )
    .await;

    participants
        .iter()
        .map(|(id, _)| (*id).clone())
        .zip(answers)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{offline_response, BackendKind, Provider, ProviderConfig};
    use crate::testing::{registry_of, ScriptedAgent};
    use std::time::Duration;

    fn ids(names: &[&str]) -> Vec<AgentId> {
        names.iter().map(|n| AgentId::from(*n)).collect()
    }

    fn keys(round: &RoundOutput) -> Vec<AgentId> {
        round.agents().cloned().collect()
    }

    #[tokio::test]
    async fn test_rounds_cover_exactly_the_selection() {
        let registry = registry_of(&[
            ("A", ScriptedAgent::echo("A")),
            ("B", ScriptedAgent::echo("B")),
            ("C", ScriptedAgent::echo("C")),
            ("J", ScriptedAgent::fixed("J", "not json")),
        ]);
        let engine = DebateEngine::new(Arc::new(registry), AgentId::from("J")).unwrap();
        let selection = ids(&["C", "A"]);

        let outcome = engine.run(&selection, "Why is the sky blue?").await.unwrap();

        assert_eq!(outcome.agents, selection);
        assert_eq!(keys(&outcome.initial), selection);
        assert_eq!(keys(&outcome.critiques), selection);
        assert_eq!(keys(&outcome.defenses), selection);
        assert_eq!(outcome.initial.get("C"), Some("C: Why is the sky blue?"));
    }

    #[tokio::test]
    async fn test_phase_prompts() {
        let a = ScriptedAgent::echo("A");
        let b = ScriptedAgent::echo("B");
        let judge = ScriptedAgent::fixed("J", "{}");
        let registry = registry_of(&[("A", a.clone()), ("B", b.clone()), ("J", judge.clone())]);
        let engine = DebateEngine::new(Arc::new(registry), AgentId::from("J")).unwrap();

        engine.run(&ids(&["A", "B"]), "q").await.unwrap();

        let prompts = a.prompts();
        assert_eq!(prompts.len(), 3);
        assert_eq!(prompts[0], "q");
        assert_eq!(prompts[1], "Critique all answers:\n[A] A: q\n[B] B: q\n");
        assert!(prompts[2].starts_with("Your answer: A: q\nCritiques:\n[A] A: Critique all answers:"));
        assert_eq!(b.prompts()[1], prompts[1]);

        let judge_prompts = judge.prompts();
        assert_eq!(judge_prompts.len(), 1);
        assert!(judge_prompts[0].contains("Return JSON: winner, scoreboard, reason."));
        assert!(judge_prompts[0].contains("\"initial\":{\"A\":\"A: q\",\"B\":\"B: q\"}"));
    }

    #[tokio::test]
    async fn test_valid_judge_verdict_is_used() {
        let registry = registry_of(&[
            ("A", ScriptedAgent::echo("A")),
            ("B", ScriptedAgent::echo("B")),
            (
                "J",
                ScriptedAgent::fixed(
                    "J",
                    "```json\n{\"winner\": \"B\", \"scoreboard\": {\"A\": 6, \"B\": 9}, \"reason\": \"clearer\"}\n```",
                ),
            ),
        ]);
        let engine = DebateEngine::new(Arc::new(registry), AgentId::from("J")).unwrap();

        let outcome = engine.run(&ids(&["A", "B"]), "q").await.unwrap();

        assert_eq!(outcome.verdict.winner.as_str(), "B");
        assert_eq!(outcome.verdict.scoreboard.get("B"), Some(&9.0));
        assert_eq!(outcome.verdict.reason, "clearer");
        assert_eq!(outcome.winning_answer(), Some("B: q"));
        assert!(outcome.judge_raw.starts_with("```json"));
    }

    #[tokio::test]
    async fn test_judge_naming_outsider_falls_back() {
        let registry = registry_of(&[
            ("A", ScriptedAgent::echo("A")),
            ("B", ScriptedAgent::echo("B")),
            ("J", ScriptedAgent::fixed("J", r#"{"winner": "J", "scoreboard": {}}"#)),
        ]);
        let engine = DebateEngine::new(Arc::new(registry), AgentId::from("J")).unwrap();

        let outcome = engine.run(&ids(&["B", "A"]), "q").await.unwrap();

        assert_eq!(outcome.verdict.winner.as_str(), "B");
        assert!(outcome.verdict.is_fallback());
    }

    #[tokio::test]
    async fn test_offline_agents_complete_run() {
        let client = reqwest::Client::new();
        let mut registry = ProviderRegistry::new();
        for (id, backend) in [("A", BackendKind::Groq), ("B", BackendKind::Gemini)] {
            let provider = Provider::new(
                ProviderConfig::offline(backend, "m"),
                client.clone(),
                Duration::from_secs(1),
            );
            registry.register(id, Arc::new(provider));
        }
        let engine = DebateEngine::new(Arc::new(registry), AgentId::from("A")).unwrap();

        let outcome = engine.run(&ids(&["A", "B"]), "Explain gravity").await.unwrap();

        assert_eq!(
            outcome.initial.get("B"),
            Some(offline_response(BackendKind::Gemini, "m", "Explain gravity", None).as_str())
        );
        assert_eq!(outcome.verdict.winner.as_str(), "A");
        assert!(outcome.verdict.is_fallback());
    }

    #[tokio::test]
    async fn test_unknown_agent_rejected_before_any_call() {
        let a = ScriptedAgent::echo("A");
        let judge = ScriptedAgent::fixed("J", "{}");
        let registry = registry_of(&[("A", a.clone()), ("J", judge.clone())]);
        let engine = DebateEngine::new(Arc::new(registry), AgentId::from("J")).unwrap();

        let err = engine.run(&ids(&["A", "ghost"]), "q").await.unwrap_err();

        assert_eq!(err, EngineError::UnknownAgent(AgentId::from("ghost")));
        assert!(a.prompts().is_empty());
        assert!(judge.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_agent_rejected_before_any_call() {
        let a = ScriptedAgent::echo("A");
        let judge = ScriptedAgent::fixed("J", "{}");
        let registry = registry_of(&[("A", a.clone()), ("J", judge.clone())]);
        let engine = DebateEngine::new(Arc::new(registry), AgentId::from("J")).unwrap();

        let err = engine.run(&ids(&["A", "A"]), "q").await.unwrap_err();

        assert_eq!(err, EngineError::DuplicateAgent(AgentId::from("A")));
        assert!(a.prompts().is_empty());
        assert!(judge.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_empty_selection_rejected() {
        let registry = registry_of(&[("J", ScriptedAgent::fixed("J", "{}"))]);
        let engine = DebateEngine::new(Arc::new(registry), AgentId::from("J")).unwrap();

        assert_eq!(engine.run(&[], "q").await.unwrap_err(), EngineError::NoAgents);
    }

    #[test]
    fn test_unknown_judge_rejected() {
        let registry = registry_of(&[("A", ScriptedAgent::echo("A"))]);
        let err = DebateEngine::new(Arc::new(registry), AgentId::from("J")).unwrap_err();
        assert_eq!(err, EngineError::UnknownAgent(AgentId::from("J")));
    }
}
