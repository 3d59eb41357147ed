// SPDX-FileCopyrightText: 2026 Chronicle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chronicle - conversation memory maintenance CLI.
//!
//! Inspects and maintains the session database that a Chronicle memory
//! service writes to.

mod commands;

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use chronicle_config::model::ChronicleConfig;
use chronicle_core::ChronicleError;
use chronicle_storage::{Database, SqliteSessionStore};

use crate::commands::OutputFormat;

/// Chronicle - conversation memory maintenance.
#[derive(Parser, Debug)]
#[command(name = "chronicle", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override `agent.id` for this invocation.
    #[arg(long, global = true)]
    agent: Option<String>,

    /// Print machine-readable JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the stored messages of a session.
    History {
        session: String,
        /// Only the newest N messages.
        #[arg(long)]
        limit: Option<usize>,
        /// Start at the newest summary checkpoint.
        #[arg(long)]
        since_checkpoint: bool,
    },
    /// Count the stored messages of a session.
    Count { session: String },
    /// List the agent's sessions.
    Sessions,
    /// Delete a session and its long-term entries.
    Clear {
        session: String,
        /// Leave long-term entries in place.
        #[arg(long)]
        keep_long_term: bool,
    },
    /// Validate configuration and check the database.
    CheckConfig,
}

fn load_config(cli: &Cli) -> ChronicleConfig {
    let loaded = match &cli.config {
        Some(path) => chronicle_config::load_and_validate_path(path),
        None => chronicle_config::load_and_validate(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            chronicle_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    if let Some(agent) = &cli.agent {
        config.agent.id = agent.clone();
    }
    config
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("chronicle={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();
}

async fn run(cli: Cli, config: ChronicleConfig) -> Result<(), ChronicleError> {
    let format = OutputFormat { json: cli.json };
    let mut out = io::stdout().lock();
    let agent_id = config.agent.id.clone();

    if let Commands::CheckConfig = cli.command {
        return commands::run_check_config(&config, &mut out).await;
    }

    let db = Database::open_config(&config.storage).await?;
    let result = match cli.command {
        Commands::History {
            session,
            limit,
            since_checkpoint,
        } => {
            commands::run_history(
                &db,
                &agent_id,
                &session,
                limit,
                since_checkpoint,
                format,
                &mut out,
            )
            .await
        }
        Commands::Count { session } => {
            let store = SqliteSessionStore::with_database(db.clone());
            commands::run_count(&store, &agent_id, &session, format, &mut out).await
        }
        Commands::Sessions => {
            let store = SqliteSessionStore::with_database(db.clone());
            commands::run_sessions(&store, &agent_id, format, &mut out).await
        }
        Commands::Clear {
            session,
            keep_long_term,
        } => commands::run_clear(&db, &config, &session, keep_long_term, &mut out).await,
        Commands::CheckConfig => Ok(()),
    };
    db.close().await?;
    result
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(&cli);
    init_tracing(&config.agent.log_level);

    if let Err(e) = run(cli, config).await {
        eprintln!("chronicle: {e}");
        std::process::exit(1);
    }
}
