//! Backend API keys.
//!
//! Keys are moved into a [`SecretString`] as soon as they are read and only
//! come back out through [`ApiCredential::expose`] when a request is built.
//! Formatting a credential never prints the key.
//!
//! A missing key is not an error: the agent answers offline. Blank values
//! count as missing.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use super::BackendKind;

/// Origin of a resolved key, reported in listings and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// `api_key` in the config file
    Inline,
    /// An environment variable
    Environment,
    /// Handed in by library code
    Programmatic,
}

impl CredentialSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialSource::Inline => "inline config",
            CredentialSource::Environment => "environment",
            CredentialSource::Programmatic => "programmatic",
        }
    }
}

/// API key for one backend.
pub struct ApiCredential {
    key: SecretString,
    backend: BackendKind,
    source: CredentialSource,
}

impl ApiCredential {
    /// `None` when `key` is blank.
    pub fn new(key: impl Into<String>, backend: BackendKind, source: CredentialSource) -> Option<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return None;
        }

        Some(Self {
            key: SecretString::from(key),
            backend,
            source,
        })
    }

    /// Inline value first, then `env_var`, else `None`.
    pub fn resolve(inline: Option<&str>, env_var: &str, backend: BackendKind) -> Option<Self> {
        if let Some(cred) = inline.and_then(|k| Self::new(k, backend, CredentialSource::Inline)) {
            return Some(cred);
        }

        let from_env = std::env::var(env_var).ok()?;
        Self::new(from_env, backend, CredentialSource::Environment)
    }

    /// Whether [`ApiCredential::resolve`] would find a key. Reads nothing
    /// into a secret.
    pub fn is_available(inline: Option<&str>, env_var: &str) -> bool {
        let present = |v: &str| !v.trim().is_empty();
        inline.is_some_and(present) || std::env::var(env_var).is_ok_and(|v| present(&v))
    }

    /// The raw key. Call only where it goes on the wire.
    pub fn expose(&self) -> &str {
        self.key.expose_secret()
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("key", &"[REDACTED]")
            .field("backend", &self.backend)
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) [REDACTED]",
            self.backend.credential_label(),
            self.source.as_str()
        )
    }
}
