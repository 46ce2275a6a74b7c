//! Subcommands and the options they share.

pub mod export;
pub mod forget;

use std::path::PathBuf;

use anyhow::{Context, Result};
use asana_export::vault::{KEY_FILE, SECRET_FILE};
use asana_export::{ExportResult, LogLevel, Secret, SecretPrompt, Vault};
use dialoguer::{theme::ColorfulTheme, Confirm, Password, Select};
use tracing::info;

/// Options given before the subcommand.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    /// Token from the environment or command line; never persisted.
    pub token: Option<String>,
    /// Asana API base URL.
    pub api_url: String,
    /// Key file path.
    pub key_file: Option<PathBuf>,
    /// Encrypted-secret file path.
    pub secret_file: Option<PathBuf>,
    /// Never prompt.
    pub non_interactive: bool,
    /// Verbosity the run was started with.
    pub log_level: LogLevel,
}

impl GlobalOptions {
    /// Vault at the configured paths.
    pub fn vault(&self) -> Vault {
        Vault::new(
            self.key_file.clone().unwrap_or_else(|| PathBuf::from(KEY_FILE)),
            self.secret_file
                .clone()
                .unwrap_or_else(|| PathBuf::from(SECRET_FILE)),
        )
    }

    /// Resolve the access token.
    ///
    /// An explicit token is used as-is. Otherwise the vault is consulted,
    /// asking the operator when running interactively.
    pub fn resolve_secret(&self) -> Result<Secret> {
        if let Some(token) = self.token.as_deref().map(str::trim) {
            if !token.is_empty() {
                info!("Using access token from the environment");
                return Ok(Secret::from(token.to_string()));
            }
        }

        let vault = self.vault();
        if self.non_interactive {
            if !vault.has_stored_secret() {
                anyhow::bail!(
                    "No stored access token at {}; set ASANA_ACCESS_TOKEN or run interactively",
                    vault.secret_path().display()
                );
            }
            return vault.load().context("Failed to load stored access token");
        }

        Ok(vault.load_or_prompt_secret(&mut DialoguerPrompt::default())?)
    }
}

/// Terminal-backed [`SecretPrompt`].
#[derive(Default)]
pub struct DialoguerPrompt {
    theme: ColorfulTheme,
}

impl SecretPrompt for DialoguerPrompt {
    fn confirm_reuse(&mut self) -> ExportResult<bool> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt("An API key is already saved. Would you like to use it?")
            .default(true)
            .interact()?)
    }

    fn read_secret(&mut self) -> ExportResult<String> {
        Ok(Password::with_theme(&self.theme)
            .with_prompt("Enter your Asana API Key")
            .interact()?)
    }
}

/// Ask for the log level.
pub fn prompt_log_level() -> Result<LogLevel> {
    let labels: Vec<String> = LogLevel::ALL.iter().map(ToString::to_string).collect();

    let idx = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select log level")
        .default(0)
        .items(&labels)
        .interact()?;

    Ok(LogLevel::ALL[idx])
}
