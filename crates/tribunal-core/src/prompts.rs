//! Prompt construction for every debate phase.
//!
//! All builders are pure: the same rounds always produce the same prompt
//! text, so offline runs are reproducible end to end.

use serde::Serialize;

use crate::types::{Domain, RoundOutput};

/// Header of the shared critique prompt.
pub const CRITIQUE_HEADER: &str = "Critique all answers:\n";

/// Instruction placed before the serialized transcript in the judge prompt.
pub const JUDGE_INSTRUCTION: &str = "Evaluate this JSON debate. Score each agent 1–10.\n\
Return JSON: winner, scoreboard, reason.";

/// Prompt asking the classifier for a single domain label.
pub fn classification_prompt(question: &str) -> String {
    let labels = Domain::ALL
        .iter()
        .map(|d| d.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!("\nClassify: {labels}.\nQuestion: {question}\nReturn ONLY domain.\n")
}

/// The critique prompt, identical for every agent in the phase.
///
/// One line per agent: `[agentId] answerText`.
pub fn critique_prompt(initial: &RoundOutput) -> String {
    let mut prompt = String::from(CRITIQUE_HEADER);
    push_labeled(&mut prompt, initial);
    prompt
}

/// The defense prompt for one agent: its own answer, then every critique.
pub fn defense_prompt(own_answer: &str, critiques: &RoundOutput) -> String {
    let mut prompt = format!("Your answer: {own_answer}\nCritiques:\n");
    push_labeled(&mut prompt, critiques);
    prompt
}

#[derive(Serialize)]
struct JudgeTranscript<'a> {
    initial: &'a RoundOutput,
    critiques: &'a RoundOutput,
    defenses: &'a RoundOutput,
}

/// The judge prompt: scoring instruction followed by the full transcript as
/// JSON.
pub fn judge_prompt(
    initial: &RoundOutput,
    critiques: &RoundOutput,
    defenses: &RoundOutput,
) -> String {
    let transcript = JudgeTranscript {
        initial,
        critiques,
        defenses,
    };
    // String-keyed maps of strings cannot fail to serialize.
    let json = serde_json::to_string(&transcript).unwrap_or_default();

    format!("\n{JUDGE_INSTRUCTION}\n\n{json}\n")
}

fn push_labeled(prompt: &mut String, round: &RoundOutput) {
    for (agent, text) in round.iter() {
        prompt.push('[');
        prompt.push_str(agent.as_str());
        prompt.push_str("] ");
        prompt.push_str(text);
        prompt.push('\n');
    }
}
