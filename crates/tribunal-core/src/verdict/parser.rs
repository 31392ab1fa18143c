//! Verdict extraction from raw judge text.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use super::schema::validate_verdict_schema;
use crate::types::{AgentId, RoundOutput, Verdict};

lazy_static! {
    /// A reply that is entirely one Markdown code fence, optionally tagged json.
    static ref FENCED_BLOCK: Regex = Regex::new(
        r"(?s)^\s*```(?:json|JSON)?[ \t]*\n(?P<body>.*?)\n?```\s*$"
    ).unwrap();
}

/// Why judge output was rejected.
#[derive(Error, Debug)]
pub enum VerdictError {
    #[error("Judge output is not JSON: {0}")]
    NotJson(#[from] serde_json::Error),

    #[error("Judge output does not match verdict schema: {}", .0.join("; "))]
    Schema(Vec<String>),

    #[error("Judge named '{0}' as winner, which did not take part in the debate")]
    UnknownWinner(AgentId),
}

/// Turns judge text into a [`Verdict`].
#[derive(Debug, Clone, Default)]
pub struct VerdictParser;

impl VerdictParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse judge output, falling back on any failure.
    ///
    /// The fallback winner is the first agent of `initial`, i.e. the first
    /// agent of the selection order. An empty `initial` yields an empty
    /// winner id.
    pub fn parse(&self, raw: &str, initial: &RoundOutput) -> Verdict {
        self.parse_with_status(raw, initial).0
    }

    /// Like [`VerdictParser::parse`], also reporting whether the fallback
    /// was taken. A judge may legitimately answer with the fallback's shape,
    /// so the verdict alone cannot tell.
    pub fn parse_with_status(&self, raw: &str, initial: &RoundOutput) -> (Verdict, bool) {
        match self.try_parse(raw, initial) {
            Ok(verdict) => (verdict, false),
            Err(e) => {
                tracing::warn!(error = %e, "Judge output unusable, using fallback verdict");
                let winner = initial
                    .first_agent()
                    .cloned()
                    .unwrap_or_else(|| AgentId::new(""));
                (Verdict::fallback(winner), true)
            }
        }
    }

    /// Parse judge output strictly.
    ///
    /// A winner outside `initial` is an error. Scoreboard entries for agents
    /// that did not debate are dropped.
    pub fn try_parse(&self, raw: &str, initial: &RoundOutput) -> Result<Verdict, VerdictError> {
        let body = strip_code_fence(raw);
        let value: serde_json::Value = serde_json::from_str(body)?;

        validate_verdict_schema(&value).map_err(VerdictError::Schema)?;

        let mut verdict: Verdict = serde_json::from_value(value)?;

        if !initial.contains(verdict.winner.as_str()) {
            return Err(VerdictError::UnknownWinner(verdict.winner));
        }

        verdict.scoreboard.retain(|agent, _| {
            let known = initial.contains(agent.as_str());
            if !known {
                tracing::debug!(agent = %agent, "Dropping score for agent outside the debate");
            }
            known
        });

        Ok(verdict)
    }
}

fn strip_code_fence(raw: &str) -> &str {
    match FENCED_BLOCK.captures(raw).and_then(|c| c.name("body")) {
        Some(body) => body.as_str(),
        None => raw.trim(),
    }
}
