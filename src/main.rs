//! # Assistant Gateway CLI (`agw`)
//!
//! ## Usage
//!
//! ```bash
//! agw --config ./config/agw.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `agw providers` | List providers, their status, and the active one |
//! | `agw index` | Run an indexing pass and print a summary |
//! | `agw search "<query>"` | Rank site content for a query |
//! | `agw context "<query>"` | Print the retrieval context block |
//! | `agw augment "<message>"` | Print the augmented prompt |
//! | `agw send "<message>"` | Send a message to a provider |
//! | `agw serve` | Start the HTTP API |
//! | `agw completions <shell>` | Print a shell completion script |
//!
//! ## Examples
//!
//! ```bash
//! # Which backends have credentials?
//! GROQ_API_KEY=gsk_... agw providers
//!
//! # Ask with site context, through OpenRouter
//! agw send "What is your refund policy?" --provider openrouter
//!
//! # Raw question, no retrieval
//! agw send "Hello" --no-context --temperature 0.2
//! ```

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::sync::Arc;

use assistant_gateway::assistant::{Assistant, SendOptions};
use assistant_gateway::commands;
use assistant_gateway::config::{self, Config};
use assistant_gateway::env::ProcessEnv;
use assistant_gateway::provider::http::ReqwestTransport;
use assistant_gateway::server;

const DEFAULT_CONFIG_PATH: &str = "./config/agw.toml";

/// Assistant Gateway: one chat contract over several LLM backends, with
/// site-content retrieval augmentation.
///
/// Credentials are read from the environment (`GROQ_API_KEY`,
/// `OPENROUTER_API_KEY`, `RUNPOD_API_KEY` + `RUNPOD_ENDPOINT_ID`).
#[derive(Parser)]
#[command(name = "agw", version)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/agw.toml`; built-in defaults apply if that
    /// file does not exist. An explicitly given path must exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List providers and which one is active.
    Providers,

    /// Index the content snapshot and print a summary.
    Index,

    /// Rank site content against a query.
    Search {
        query: String,

        /// Maximum number of results (defaults to `retrieval.search_limit`).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the context block that would be prepended for a query.
    Context { query: String },

    /// Print a message with its retrieval context prepended.
    Augment { message: String },

    /// Send a message to a provider.
    ///
    /// Without `--provider`, the configured provider is used, falling back
    /// to groq when it is not configured.
    Send {
        message: String,

        /// Provider identifier (`groq`, `runpod`, `openrouter`). Fails
        /// rather than falling back if it is not configured.
        #[arg(long)]
        provider: Option<String>,

        #[arg(long)]
        model: Option<String>,

        /// Sampling temperature, 0 to 2.
        #[arg(long)]
        temperature: Option<f32>,

        #[arg(long)]
        max_tokens: Option<u32>,

        /// Send the message as-is, without retrieved site content.
        #[arg(long)]
        no_context: bool,

        /// Give up on the provider after this many seconds.
        #[arg(long)]
        deadline: Option<u64>,
    },

    /// Start the HTTP API on `server.bind`.
    Serve,

    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("assistant_gateway=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => config::load_config(path),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.exists() {
                config::load_config(&default)
            } else {
                Ok(Config::default())
            }
        }
    }
}

// The blocking HTTP client must not be created or dropped inside the tokio
// runtime, so main stays synchronous and `serve` builds its own runtime.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "agw", &mut std::io::stdout());
        return Ok(());
    }

    init_logging();

    let cfg = load(cli.config.as_ref())?;
    let transport = Arc::new(ReqwestTransport::new()?);
    let assistant = Arc::new(Assistant::from_config(
        &cfg,
        Arc::new(ProcessEnv),
        transport,
    )?);

    match cli.command {
        Commands::Providers => commands::run_providers(&assistant),
        Commands::Index => commands::run_index(&assistant),
        Commands::Search { query, limit } => commands::run_search(&assistant, &query, limit),
        Commands::Context { query } => commands::run_context(&assistant, &query),
        Commands::Augment { message } => commands::run_augment(&assistant, &message),
        Commands::Send {
            message,
            provider,
            model,
            temperature,
            max_tokens,
            no_context,
            deadline,
        } => {
            let options = SendOptions {
                provider,
                model,
                temperature,
                max_tokens,
                use_context: !no_context,
                deadline_secs: deadline,
            };
            commands::run_send(&assistant, &message, &options)?;
        }
        Commands::Serve => {
            let runtime = tokio::runtime::Runtime::new()
                .context("Failed to start the async runtime")?;
            runtime.block_on(server::run_server(assistant.clone(), &cfg.server.bind))?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
