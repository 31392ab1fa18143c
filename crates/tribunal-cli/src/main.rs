//! `tribunal`: run multi-model debates from the command line.
//!
//! ```bash
//! # Debate with the built-in agents (offline unless API keys are set)
//! tribunal debate "Why does ice float on water?" --use-improved
//!
//! # Custom agents, routing and timeouts
//! TRIBUNAL_CONFIG=tribunal.yaml tribunal agents
//! ```
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use tribunal_core::AgentId;
use tribunal_runtime::{
    DebateRequest, DebateResponse, DebateService, DebateStore, JsonFileStore, MemoryStore,
    RuntimeConfig, ServiceError,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Multi-model AI debates with a judged verdict", long_about = None)]
struct Cli {
    /// YAML configuration file (built-in agents when omitted)
    #[arg(short, long, global = true, env = "TRIBUNAL_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Debate a question
    Debate {
        question: String,

        /// Append to an existing conversation
        #[arg(long, alias = "chat-id")]
        conversation_id: Option<String>,

        /// Skip the prompt advisor
        #[arg(long)]
        use_improved: bool,

        /// Prompt to debate instead of the question (implies --use-improved)
        #[arg(long)]
        improved_prompt: Option<String>,

        /// Do not write the transcript to the history directory
        #[arg(long)]
        no_history: bool,
    },

    /// Show the domain and agents a question would be routed to
    Classify { question: String },

    /// List configured agents
    Agents,

    /// Print the stored transcript of a conversation
    History { conversation_id: String },

    /// Validate the configuration
    Check,
}

#[derive(Serialize)]
struct AgentListing<'a> {
    id: &'a AgentId,
    backend: &'a str,
    model: &'a str,
    base_url: &'a str,
    credential_env: &'a str,
    online: bool,
}

#[derive(Serialize)]
struct Routing<'a> {
    domain: tribunal_core::Domain,
    agents: &'a [AgentId],
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose > 0 {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Debate {
            question,
            conversation_id,
            use_improved,
            improved_prompt,
            no_history,
        } => {
            let mut service = DebateService::from_config(&config)
                .context("Failed to build debate service")?;
            if no_history {
                service = service.with_store(Arc::new(MemoryStore::new()));
            }

            let request = DebateRequest {
                question,
                conversation_id,
                use_improved: use_improved || improved_prompt.is_some(),
                improved_prompt,
            };

            match service.handle(request).await {
                Ok(response) => print_json(&response)?,
                Err(ServiceError::HistoryNotSaved { report, source }) => {
                    print_json(&DebateResponse::Debated(*report))?;
                    return Err(anyhow::Error::new(source)
                        .context("Debate finished but its transcript was not saved"));
                }
                Err(e) => return Err(e).context("Debate failed"),
            }
        }

        Command::Classify { question } => {
            let service = DebateService::from_config(&config)
                .context("Failed to build debate service")?;
            let (domain, agents) = service.router().route(&question).await;
            print_json(&Routing {
                domain,
                agents: &agents,
            })?;
        }

        Command::Agents => {
            let listing: Vec<_> = config
                .agents
                .iter()
                .map(|agent| AgentListing {
                    id: &agent.id,
                    backend: agent.backend.as_str(),
                    model: &agent.model,
                    base_url: agent.base_url(),
                    credential_env: agent.credential_env(),
                    online: agent.has_credential(),
                })
                .collect();
            print_json(&listing)?;
        }

        Command::History { conversation_id } => {
            let store = JsonFileStore::new(&config.history_dir);
            let records = store
                .load(&conversation_id)
                .await
                .with_context(|| format!("Failed to load conversation '{conversation_id}'"))?;
            print_json(&records)?;
        }

        Command::Check => {
            DebateService::from_config(&config).context("Configuration is invalid")?;
            print_json(&serde_json::json!({
                "status": "ok",
                "agents": config.agents.len(),
                "classifier": config.classifier,
                "judge": config.judge,
                "request_timeout_ms": config.request_timeout.as_millis() as u64,
                "history_dir": config.history_dir,
            }))?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<RuntimeConfig> {
    match path {
        Some(path) => RuntimeConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => {
            tracing::debug!("No config file given, using built-in agents");
            let config = RuntimeConfig::default();
            config.validate().context("Built-in configuration is invalid")?;
            Ok(config)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{text}");
    Ok(())
}
