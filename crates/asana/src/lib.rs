//! Read-only Asana API client.
//!
//! This crate exposes the small slice of the Asana REST API the exporter
//! needs: workspaces, projects, tasks, subtasks and story feeds. Callers
//! depend on the [`TaskSource`] trait so the exporter can run against an
//! in-memory source in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use asana::{Asana, TaskSource};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Asana::new("personal-access-token")?;
//!
//!     for workspace in client.list_workspaces().await? {
//!         println!("{} ({})", workspace.name, workspace.gid);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod client;
mod models;
mod traits;

pub use client::{Asana, API_BASE_URL};
pub use traits::{
    AsanaError, Project, Story, Task, TaskSource, TaskSummary, UserRef, Workspace,
};
