//! Core types for Tribunal debates.

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

/// Reason string attached to the verdict produced when the judge output
/// cannot be used.
pub const JUDGE_FALLBACK_REASON: &str = "Judge fallback";

/// Identifier of a debating agent, unique within a provider registry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AgentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for AgentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Classification bucket for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Coding,
    Mechanical,
    Math,
    Physics,
    General,
}

impl Domain {
    /// Every domain, in the order they are offered to the classifier.
    pub const ALL: [Domain; 5] = [
        Domain::Coding,
        Domain::Mechanical,
        Domain::Math,
        Domain::Physics,
        Domain::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Coding => "coding",
            Domain::Mechanical => "mechanical",
            Domain::Math => "math",
            Domain::Physics => "physics",
            Domain::General => "general",
        }
    }

    /// Parse an exact label. Returns `None` for anything else.
    pub fn parse_label(label: &str) -> Option<Domain> {
        Self::ALL.into_iter().find(|d| d.as_str() == label)
    }

    /// Interpret free classifier output.
    ///
    /// The text is trimmed and lower-cased; anything that is not exactly one
    /// of the known labels resolves to [`Domain::General`].
    pub fn from_label(text: &str) -> Domain {
        let normalized = text.trim().to_lowercase();
        Self::parse_label(&normalized).unwrap_or(Domain::General)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the four debate phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Initial,
    Critique,
    Defense,
    Judge,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Initial => "initial",
            Phase::Critique => "critique",
            Phase::Defense => "defense",
            Phase::Judge => "judge",
        };
        f.write_str(name)
    }
}

/// Per-agent text produced by one phase.
///
/// Iteration order is insertion order, which the engine keeps equal to the
/// selected agent list. Serializes as a JSON object in that same order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundOutput {
    entries: Vec<(AgentId, String)>,
}

impl RoundOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the text for `agent`. Replacing keeps the original
    /// position.
    pub fn insert(&mut self, agent: AgentId, text: impl Into<String>) {
        let text = text.into();
        match self.entries.iter_mut().find(|(id, _)| *id == agent) {
            Some((_, existing)) => *existing = text,
            None => self.entries.push((agent, text)),
        }
    }

    pub fn get(&self, agent: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(id, _)| id.as_str() == agent)
            .map(|(_, text)| text.as_str())
    }

    pub fn contains(&self, agent: &str) -> bool {
        self.get(agent).is_some()
    }

    /// The first agent in iteration order.
    pub fn first_agent(&self) -> Option<&AgentId> {
        self.entries.first().map(|(id, _)| id)
    }

    pub fn agents(&self) -> impl Iterator<Item = &AgentId> {
        self.entries.iter().map(|(id, _)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AgentId, &str)> {
        self.entries.iter().map(|(id, text)| (id, text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(AgentId, String)> for RoundOutput {
    fn from_iter<I: IntoIterator<Item = (AgentId, String)>>(iter: I) -> Self {
        let mut round = RoundOutput::new();
        for (agent, text) in iter {
            round.insert(agent, text);
        }
        round
    }
}

impl Serialize for RoundOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (agent, text) in &self.entries {
            map.serialize_entry(agent, text)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RoundOutput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RoundVisitor;

        impl<'de> Visitor<'de> for RoundVisitor {
            type Value = RoundOutput;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of agent id to text")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<RoundOutput, M::Error> {
                let mut round = RoundOutput::new();
                while let Some((agent, text)) = map.next_entry::<AgentId, String>()? {
                    round.insert(agent, text);
                }
                Ok(round)
            }
        }

        deserializer.deserialize_map(RoundVisitor)
    }
}

/// The judge's decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub winner: AgentId,

    #[serde(default)]
    pub scoreboard: BTreeMap<AgentId, f64>,

    #[serde(default)]
    pub reason: String,
}

impl Verdict {
    /// The verdict used when judge output is unusable: the first agent wins
    /// with an empty scoreboard.
    pub fn fallback(winner: AgentId) -> Self {
        Self {
            winner,
            scoreboard: BTreeMap::new(),
            reason: JUDGE_FALLBACK_REASON.to_string(),
        }
    }

    /// Whether this has the fallback's shape. A judge can produce the same
    /// shape on purpose; [`crate::VerdictParser::parse_with_status`] knows
    /// which path was taken.
    pub fn is_fallback(&self) -> bool {
        self.scoreboard.is_empty() && self.reason == JUDGE_FALLBACK_REASON
    }
}

/// Everything one debate run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateOutcome {
    /// Participating agents in selection order
    pub agents: Vec<AgentId>,

    pub initial: RoundOutput,
    pub critiques: RoundOutput,
    pub defenses: RoundOutput,
    pub verdict: Verdict,

    /// Unparsed judge output
    pub judge_raw: String,
}

impl DebateOutcome {
    /// The winning agent's initial answer.
    pub fn winning_answer(&self) -> Option<&str> {
        self.initial.get(self.verdict.winner.as_str())
    }
}

/// A completed run as handed to persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateRecord {
    pub prompt: String,
    pub initial: RoundOutput,
    pub critiques: RoundOutput,
    pub defenses: RoundOutput,
    pub verdict: Verdict,
    pub recorded_at: DateTime<Utc>,
}

impl DebateRecord {
    pub fn from_outcome(prompt: impl Into<String>, outcome: &DebateOutcome) -> Self {
        Self {
            prompt: prompt.into(),
            initial: outcome.initial.clone(),
            critiques: outcome.critiques.clone(),
            defenses: outcome.defenses.clone(),
            verdict: outcome.verdict.clone(),
            recorded_at: Utc::now(),
        }
    }
}
