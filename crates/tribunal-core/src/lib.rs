//! # tribunal-core
//!
//! Deterministic model of a multi-model debate.
//!
//! This crate holds everything about a debate that does not touch the
//! network:
//! - Domain classification labels and the domain → agent routing table
//! - Prompt text for the critique, defense and judge phases
//! - Verdict parsing with schema validation and a fixed fallback
//! - The prompt advisor consulted before a debate starts
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: prompt builders and the verdict parser are pure
//! 2. **Total**: verdict parsing never fails; unusable judge output becomes
//!    the fallback verdict
//! 3. **Ordered**: round outputs iterate in agent selection order
//!
//! ## Example
//!
//! ```rust
//! use tribunal_core::{AgentId, RoundOutput, VerdictParser};
//!
//! let mut initial = RoundOutput::new();
//! initial.insert(AgentId::from("A"), "answer a");
//! initial.insert(AgentId::from("B"), "answer b");
//!
//! let verdict = VerdictParser::new().parse("no json here", &initial);
//! assert_eq!(verdict.winner.as_str(), "A");
//! assert_eq!(verdict.reason, "Judge fallback");
//! ```

pub mod advisor;
pub mod prompts;
pub mod routing;
pub mod types;
pub mod verdict;

pub use advisor::{HeuristicAdvisor, PromptAdvice, PromptAdvisor};
pub use routing::{DomainTable, RoutingError};
pub use types::{
    AgentId, DebateOutcome, DebateRecord, Domain, Phase, RoundOutput, Verdict,
    JUDGE_FALLBACK_REASON,
};
pub use verdict::{VerdictError, VerdictParser};
