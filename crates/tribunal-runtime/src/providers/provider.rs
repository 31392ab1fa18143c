//! The stock [`Agent`]: one backend configuration with offline degradation.

use async_trait::async_trait;
use std::time::Duration;

use super::{chat, gemini, Agent, ApiCredential, BackendKind, ProviderError, WireFormat};

/// Everything needed to reach one backend. Immutable after construction.
#[derive(Debug)]
pub struct ProviderConfig {
    pub backend: BackendKind,
    pub model: String,

    /// `None` means every answer is the offline response
    pub credential: Option<ApiCredential>,

    pub base_url: String,
}

impl ProviderConfig {
    /// Config with the backend's default endpoint and no credential.
    pub fn offline(backend: BackendKind, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            credential: None,
            base_url: backend.default_base_url().to_string(),
        }
    }

    pub fn with_credential(mut self, credential: Option<ApiCredential>) -> Self {
        self.credential = credential;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Deterministic stand-in answer used without a credential or after a
/// failed call. Pure in all four inputs; an empty system prompt counts as
/// absent.
pub fn offline_response(
    backend: BackendKind,
    model: &str,
    prompt: &str,
    system_prompt: Option<&str>,
) -> String {
    let system = system_prompt
        .filter(|s| !s.is_empty())
        .map(|s| format!("[System: {s}]"))
        .unwrap_or_default();

    format!(
        "(Offline {backend}/{model}) {system}\n\
         I am an offline local AI model and cannot call external APIs.\n\
         Here is a helpful simulated answer to your prompt:\n\n\
         → {prompt}\n\n\
         (This is a dummy response used only for local testing.)"
    )
}

/// A backend-bound agent.
///
/// # Security
///
/// The credential is an [`ApiCredential`]: it is redacted in `Debug` output
/// and exposed only when a request is built.
pub struct Provider {
    config: ProviderConfig,
    client: reqwest::Client,
    timeout: Duration,
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("config", &self.config)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Provider {
    /// Create a provider sharing `client`'s connection pool. Each call is
    /// bounded by `timeout`.
    pub fn new(config: ProviderConfig, client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            config,
            client,
            timeout,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn offline(&self, prompt: &str, system_prompt: Option<&str>) -> String {
        offline_response(self.config.backend, &self.config.model, prompt, system_prompt)
    }

    async fn dispatch(
        &self,
        credential: &ApiCredential,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, ProviderError> {
        match self.config.backend.wire_format() {
            WireFormat::ChatCompletions => {
                chat::complete(
                    &self.client,
                    &self.config.base_url,
                    credential,
                    &self.config.model,
                    prompt,
                    system_prompt,
                )
                .await
            }
            WireFormat::GenerateContent => {
                gemini::generate(
                    &self.client,
                    &self.config.base_url,
                    credential,
                    &self.config.model,
                    prompt,
                    system_prompt,
                )
                .await
            }
        }
    }

    /// Single attempt against the backend, bounded by the call timeout.
    async fn try_ask(
        &self,
        credential: &ApiCredential,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, ProviderError> {
        match tokio::time::timeout(self.timeout, self.dispatch(credential, prompt, system_prompt))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl Agent for Provider {
    async fn ask(&self, prompt: &str, system_prompt: Option<&str>) -> String {
        let system_prompt = system_prompt.filter(|s| !s.is_empty());
        let Some(credential) = &self.config.credential else {
            return self.offline(prompt, system_prompt);
        };

        match self.try_ask(credential, prompt, system_prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    backend = %self.config.backend,
                    model = %self.config.model,
                    error = %e,
                    "Provider call failed, using offline fallback"
                );
                self.offline(prompt, system_prompt)
            }
        }
    }

    fn name(&self) -> &str {
        self.config.backend.as_str()
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn is_online(&self) -> bool {
        self.config.credential.is_some()
    }
}
