//! Prompt improvement before a debate starts.
//!
//! The advisor only proposes a rewrite. Whether the rewrite is used is the
//! caller's decision (see the request service in `tribunal-runtime`).

/// Default explanation attached to a rewritten prompt.
pub const DEFAULT_IMPROVEMENT_NOTE: &str = "This version makes the request clearer, more \
structured, and easier for AI models to answer well.";

/// A proposed rewrite of the user's prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptAdvice {
    pub improved: String,
    pub reason: String,
}

impl PromptAdvice {
    /// Whether the proposal differs from `original` beyond surrounding
    /// whitespace.
    pub fn changes(&self, original: &str) -> bool {
        self.improved.trim() != original.trim()
    }
}

/// Rewrites prompts before they are debated.
pub trait PromptAdvisor: Send + Sync {
    fn improve(&self, prompt: &str) -> PromptAdvice;
}

/// Word-count heuristic: short prompts are expanded into an explicit
/// request for a structured explanation, longer ones are left alone.
#[derive(Debug, Clone)]
pub struct HeuristicAdvisor {
    /// Prompts with more words than this are considered clear
    pub min_words: usize,

    /// Reason given when a prompt is rewritten
    pub note: String,
}

impl Default for HeuristicAdvisor {
    fn default() -> Self {
        Self {
            min_words: 6,
            note: DEFAULT_IMPROVEMENT_NOTE.to_string(),
        }
    }
}

impl HeuristicAdvisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

impl PromptAdvisor for HeuristicAdvisor {
    fn improve(&self, prompt: &str) -> PromptAdvice {
        if prompt.is_empty() {
            return PromptAdvice {
                improved: String::new(),
                reason: "Prompt was empty.".to_string(),
            };
        }

        let original = prompt.trim();

        if original.split_whitespace().count() > self.min_words {
            return PromptAdvice {
                improved: original.to_string(),
                reason: "Prompt already looks clear.".to_string(),
            };
        }

        PromptAdvice {
            improved: format!("Provide a detailed, well-structured explanation about: {original}"),
            reason: self.note.clone(),
        }
    }
}
