//! # tribunal-runtime
//!
//! The async half of Tribunal: backend providers, agent routing, the
//! four-phase debate engine and transcript persistence.
//!
//! ## Offline by default
//!
//! An agent without a credential answers with a deterministic simulated
//! response, and an agent whose call fails degrades to the same text. A
//! debate therefore always completes once its configuration is valid,
//! which also makes the whole pipeline testable without network access.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tribunal_runtime::{DebateRequest, DebateResponse, DebateService, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_yaml_file("tribunal.yaml")?;
//! let service = DebateService::from_config(&config)?;
//!
//! let mut request = DebateRequest::new("Why does ice float on water?");
//! request.use_improved = true;
//!
//! if let DebateResponse::Debated(report) = service.handle(request).await? {
//!     println!("{} won: {}", report.winner, report.answer);
//! }
//! ```

pub mod config;
pub mod engine;
pub mod history;
pub mod providers;
pub mod router;
pub mod service;

#[cfg(test)]
mod testing;

pub use config::{AgentConfig, ConfigError, RuntimeConfig};
pub use engine::{DebateEngine, EngineError};
pub use history::{DebateStore, HistoryError, JsonFileStore, MemoryStore};
pub use providers::{Agent, BackendKind, Provider, ProviderConfig, ProviderRegistry};
pub use router::DomainRouter;
pub use service::{
    ConfirmationPayload, DebateReport, DebateRequest, DebateResponse, DebateService,
    ServiceError,
};
