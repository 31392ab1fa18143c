//! Runtime configuration.
//!
//! Loaded once at startup from YAML (or defaulted) and read-only afterwards.
//!
//! ```yaml
//! agents:
//!   - id: gpt4_coder
//!     backend: openai
//!     model: gpt-4.1
//!   - id: local_llama
//!     backend: groq
//!     model: llama3-70b-8192
//!     base_url: http://localhost:8080/v1
//!     api_key_env: LOCAL_LLAMA_KEY
//! routing:
//!   general: [gpt4_coder, local_llama]
//! classifier: gpt4_coder
//! judge: gpt4_coder
//! request_timeout: 30s
//! history_dir: chat_history
//! ```

use serde::{Deserialize, Deserializer};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use tribunal_core::{AgentId, DomainTable, RoutingError};

use crate::providers::{ApiCredential, BackendKind, ProviderConfig};

/// Default per-call timeout for backend requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{role} agent '{agent}' is not a configured agent")]
    UnknownProvider { role: &'static str, agent: AgentId },

    #[error("Agent '{0}' is configured more than once")]
    DuplicateAgent(AgentId),

    #[error("Agent '{agent}' has invalid base_url '{url}': expected http:// or https://")]
    InvalidBaseUrl { agent: AgentId, url: String },

    #[error("request_timeout must be greater than zero")]
    ZeroTimeout,

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// One debating agent.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub id: AgentId,
    pub backend: BackendKind,
    pub model: String,

    /// Overrides the backend's default endpoint
    #[serde(default)]
    pub base_url: Option<String>,

    /// Inline key; prefer `api_key_env`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable to read the key from, instead of the backend default
    #[serde(default)]
    pub api_key_env: Option<String>,
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("id", &self.id)
            .field("backend", &self.backend)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_key_env", &self.api_key_env)
            .finish()
    }
}

impl AgentConfig {
    pub fn new(id: impl Into<AgentId>, backend: BackendKind, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            backend,
            model: model.into(),
            base_url: None,
            api_key: None,
            api_key_env: None,
        }
    }

    /// Environment variable consulted for the key.
    pub fn credential_env(&self) -> &str {
        self.api_key_env
            .as_deref()
            .unwrap_or_else(|| self.backend.credential_env())
    }

    /// Resolve the credential: inline key, then environment, else absent.
    pub fn credential(&self) -> Option<ApiCredential> {
        ApiCredential::resolve(self.api_key.as_deref(), self.credential_env(), self.backend)
    }

    /// Whether a credential would resolve, without loading it.
    pub fn has_credential(&self) -> bool {
        ApiCredential::is_available(self.api_key.as_deref(), self.credential_env())
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.backend.default_base_url())
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig::offline(self.backend, self.model.clone())
            .with_base_url(self.base_url())
            .with_credential(self.credential())
    }
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub agents: Vec<AgentConfig>,

    /// Domain → ordered agent list
    pub routing: DomainTable,

    /// Agent asked to classify questions
    pub classifier: AgentId,

    /// Agent that scores the debate
    pub judge: AgentId,

    #[serde(deserialize_with = "deserialize_duration")]
    pub request_timeout: Duration,

    /// Directory holding one JSON file per conversation
    pub history_dir: PathBuf,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            agents: vec![
                AgentConfig::new("gpt4_coder", BackendKind::OpenAi, "gpt-4.1"),
                AgentConfig::new("groq_llama", BackendKind::Groq, "llama3-70b-8192"),
                AgentConfig::new("gemini_flash", BackendKind::Gemini, "gemini-1.5-flash"),
                AgentConfig::new("deepseek_chat", BackendKind::DeepSeek, "deepseek-chat"),
            ],
            routing: DomainTable::default(),
            classifier: AgentId::from("gpt4_coder"),
            judge: AgentId::from("gpt4_coder"),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            history_dir: PathBuf::from("chat_history"),
        }
    }
}

impl RuntimeConfig {
    /// Parse and validate YAML configuration.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML configuration file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    pub fn agent(&self, id: &str) -> Option<&AgentConfig> {
        self.agents.iter().find(|a| a.id.as_str() == id)
    }

    /// Check every cross-reference. Run before any provider is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for agent in &self.agents {
            if !seen.insert(agent.id.as_str()) {
                return Err(ConfigError::DuplicateAgent(agent.id.clone()));
            }
            if let Some(url) = &agent.base_url {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ConfigError::InvalidBaseUrl {
                        agent: agent.id.clone(),
                        url: url.clone(),
                    });
                }
            }
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        self.routing.validate(|id| seen.contains(id.as_str()))?;

        for (role, agent) in [("Classifier", &self.classifier), ("Judge", &self.judge)] {
            if !seen.contains(agent.as_str()) {
                return Err(ConfigError::UnknownProvider {
                    role,
                    agent: agent.clone(),
                });
            }
        }

        Ok(())
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    humantime::parse_duration(&text).map_err(serde::de::Error::custom)
}
