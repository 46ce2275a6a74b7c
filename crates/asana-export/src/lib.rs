//! Asana task exporter.
//!
//! Aggregates every task of one or more Asana projects into a tree of
//! [`TaskRecord`]s (subtasks and user comments included), then writes one
//! YAML, JSON or CSV file per project. The access token is kept on disk
//! encrypted with AES-256-GCM.
//!
//! # Example
//!
//! ```ignore
//! use asana_export::{run_export, ExportConfig, ProjectScope, Session, Vault};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let secret = Vault::default().load()?;
//!     let session = Session::connect(&secret, asana::API_BASE_URL)?;
//!     let workspace = session.workspaces().await?.remove(0);
//!     let projects = session.projects(&workspace).await?;
//!     let config = ExportConfig::new(workspace, ProjectScope::All(projects));
//!     let summary = run_export(&session, &config).await?;
//!     println!("{} tasks exported", summary.tasks_exported());
//!     Ok(())
//! }
//! ```

// Allow product names without backticks in doc comments
#![allow(clippy::doc_markdown)]

pub mod aggregate;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod pipeline;
pub mod record;
pub mod session;
pub mod ui;
pub mod vault;

pub use aggregate::{AggregateOptions, Aggregator};
pub use config::{
    ExportConfig, ExportFormat, FieldProjection, LogLevel, ProjectScope, StatusFilter,
};
pub use error::{ExportError, ExportResult};
pub use pipeline::{run_export, ExportSummary, ProjectOutcome, RunStatus, TaskFailure};
pub use record::{CommentRecord, TaskRecord};
pub use session::Session;
pub use vault::{Secret, SecretPrompt, Vault};
