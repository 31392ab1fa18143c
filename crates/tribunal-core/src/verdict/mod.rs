//! Judge verdict parsing.
//!
//! The judge answers in free text that should contain a JSON object with
//! `winner`, `scoreboard` and `reason`. Anything unusable resolves to the
//! fixed fallback verdict; parsing never fails outward.

mod parser;
mod schema;

pub use parser::{VerdictError, VerdictParser};
pub use schema::validate_verdict_schema;
