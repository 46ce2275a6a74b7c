//! Asana task export CLI.
//!
//! Exports every task of an Asana project, with nested subtasks and user
//! comments, to YAML, CSV or JSON. The access token is stored encrypted next
//! to the key that seals it.

// Allow product names without backticks in doc comments
#![allow(clippy::doc_markdown)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use asana_export::{logging, ui, LogLevel};
use clap::{Parser, Subcommand};
use tracing::error;

mod commands;

use commands::export::ExportCommand;
use commands::forget::ForgetCommand;
use commands::{prompt_log_level, GlobalOptions};

/// Asana task exporter.
#[derive(Parser)]
#[command(
    name = "asana-export",
    version,
    about = "Export Asana tasks, subtasks and comments",
    long_about = "Export the tasks of an Asana project, with nested subtasks and comments,\n\
                  to YAML, CSV or JSON.\n\n\
                  Without a subcommand, runs an interactive export."
)]
#[command(propagate_version = true)]
struct Cli {
    /// Asana personal access token (not persisted)
    #[arg(long, global = true, env = "ASANA_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Asana API base URL
    #[arg(long, global = true, env = "ASANA_API_URL", default_value = asana::API_BASE_URL)]
    api_url: String,

    /// Key file sealing the stored token
    #[arg(long, global = true, value_name = "FILE")]
    key_file: Option<PathBuf>,

    /// Encrypted token file
    #[arg(long, global = true, value_name = "FILE")]
    secret_file: Option<PathBuf>,

    /// Log level (info, debug, warning, error)
    #[arg(short, long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Never prompt; every choice comes from flags or defaults
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export project tasks (default).
    Export(ExportCommand),

    /// Delete the stored encrypted access token.
    Forget(ForgetCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ui::print_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let command = cli
        .command
        .unwrap_or_else(|| Commands::Export(ExportCommand::default()));

    let log_level = match cli.log_level.as_deref() {
        Some(level) => level.parse()?,
        None if cli.non_interactive || matches!(command, Commands::Forget(_)) => {
            LogLevel::default()
        }
        None => prompt_log_level()?,
    };
    logging::init(log_level);

    let options = GlobalOptions {
        token: cli.token,
        api_url: cli.api_url,
        key_file: cli.key_file,
        secret_file: cli.secret_file,
        non_interactive: cli.non_interactive,
        log_level,
    };

    match command {
        Commands::Export(cmd) => {
            let summary = cmd.run(&options).await?;
            Ok(summary.status().exit_code())
        }
        Commands::Forget(cmd) => {
            cmd.run(&options)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
