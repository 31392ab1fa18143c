//! Backend provider abstractions for tribunal-runtime.
//!
//! Every debating agent sits behind the [`Agent`] trait. The stock
//! implementation is [`Provider`], which talks to one backend configuration
//! and degrades to a deterministic offline answer when it has no
//! credential or the call fails.
//!
//! ## Security
//!
//! Credentials are held as [`ApiCredential`]s. See the [`secrets`] module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

mod chat;
mod gemini;
mod provider;
mod registry;
pub mod secrets;

pub use provider::{offline_response, Provider, ProviderConfig};
pub use registry::ProviderRegistry;
pub use secrets::{ApiCredential, CredentialSource};

/// Failures inside a backend call.
///
/// These never leave a [`Provider`]: they are logged and replaced by the
/// offline response.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Unexpected response shape: {0}")]
    MalformedResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

/// The kind of backend an agent talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    OpenAi,
    Groq,
    Gemini,
    DeepSeek,
}

/// Request/response convention spoken by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// `POST {base}/chat/completions` with bearer auth
    ChatCompletions,
    /// `POST {base}/{model}:generateContent?key=...`
    GenerateContent,
}

impl BackendKind {
    /// Name used in logs and offline responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::OpenAi => "openai",
            BackendKind::Groq => "groq",
            BackendKind::Gemini => "gemini",
            BackendKind::DeepSeek => "deepseek",
        }
    }

    pub fn wire_format(&self) -> WireFormat {
        match self {
            BackendKind::OpenAi | BackendKind::Groq | BackendKind::DeepSeek => {
                WireFormat::ChatCompletions
            }
            BackendKind::Gemini => WireFormat::GenerateContent,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            BackendKind::OpenAi => "https://api.openai.com/v1",
            BackendKind::Groq => "https://api.groq.com/openai/v1",
            BackendKind::Gemini => "https://generativelanguage.googleapis.com/v1beta/models",
            BackendKind::DeepSeek => "https://api.deepseek.com/v1",
        }
    }

    /// Environment variable consulted when the config carries no key.
    pub fn credential_env(&self) -> &'static str {
        match self {
            BackendKind::OpenAi => "OPENAI_API_KEY",
            BackendKind::Groq => "GROQ_API_KEY",
            BackendKind::Gemini => "GEMINI_API_KEY",
            BackendKind::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }

    /// Human-readable credential name for redacted output.
    pub fn credential_label(&self) -> &'static str {
        match self {
            BackendKind::OpenAi => "OpenAI API key",
            BackendKind::Groq => "Groq API key",
            BackendKind::Gemini => "Gemini API key",
            BackendKind::DeepSeek => "DeepSeek API key",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chat message in the chat-completions wire format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Role: "system" or "user"
    pub role: String,

    /// Message content
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A debate participant.
///
/// # Contract
/// `ask` is total: it always returns text and never surfaces a transport,
/// status or parsing failure. Implementations hold no per-call mutable
/// state, so one instance may serve concurrent debates.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Answer `prompt`, optionally steered by `system_prompt`.
    async fn ask(&self, prompt: &str, system_prompt: Option<&str>) -> String;

    /// Backend name for logs and listings.
    fn name(&self) -> &str;

    /// Model identifier for logs and listings.
    fn model(&self) -> &str;

    /// Whether calls reach a real backend (false means offline answers).
    fn is_online(&self) -> bool {
        true
    }
}
