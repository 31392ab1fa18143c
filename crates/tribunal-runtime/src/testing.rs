//! Test agents with canned behavior.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::providers::{Agent, ProviderRegistry};

/// Answers through a closure and records every prompt it was asked.
pub(crate) struct ScriptedAgent {
    name: String,
    respond: Box<dyn Fn(&str) -> String + Send + Sync>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedAgent {
    pub(crate) fn new(
        name: &str,
        respond: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            respond: Box::new(respond),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Always answers `reply`.
    pub(crate) fn fixed(name: &str, reply: &str) -> Arc<Self> {
        let reply = reply.to_string();
        Self::new(name, move |_| reply.clone())
    }

    /// Answers `"{name}: {prompt}"`.
    pub(crate) fn echo(name: &str) -> Arc<Self> {
        let tag = name.to_string();
        Self::new(name, move |prompt| format!("{tag}: {prompt}"))
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    async fn ask(&self, prompt: &str, _system_prompt: Option<&str>) -> String {
        self.prompts.lock().push(prompt.to_string());
        (self.respond)(prompt)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

pub(crate) fn registry_of(agents: &[(&str, Arc<ScriptedAgent>)]) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for (id, agent) in agents {
        registry.register(*id, agent.clone());
    }
    registry
}
