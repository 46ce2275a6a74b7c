//! Export run configuration.
//!
//! Every choice the operator makes is collected into an [`ExportConfig`]
//! before any task is fetched; the pipeline only reads it.

use std::path::PathBuf;

use asana::{Project, Workspace};
use serde::{Deserialize, Serialize};

use crate::error::{ExportError, ExportResult};
use crate::record::TaskRecord;

/// Default maximum subtask nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default number of sibling subtasks resolved at once.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// YAML document.
    Yaml,
    /// Comma-separated values (lossy for nested data).
    Csv,
    /// Pretty-printed JSON.
    #[default]
    Json,
}

impl ExportFormat {
    /// All formats, in menu order.
    pub const ALL: [Self; 3] = [Self::Yaml, Self::Csv, Self::Json];

    /// File extension without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yaml => write!(f, "YAML"),
            Self::Csv => write!(f, "CSV"),
            Self::Json => write!(f, "JSON"),
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(anyhow::anyhow!(
                "Unknown format: {s}. Supported: yaml, csv, json"
            )),
        }
    }
}

/// Which fields of each record are exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldProjection {
    /// Every field, including identifiers and nested subtasks.
    #[default]
    Full,
    /// Only [`FieldProjection::BASIC_FIELDS`].
    BasicOnly,
}

impl FieldProjection {
    /// Fields kept by [`FieldProjection::BasicOnly`], in output order.
    pub const BASIC_FIELDS: [&'static str; 6] =
        ["name", "created_at", "due_on", "notes", "assignee", "comments"];

    /// Map the "basic fields only?" answer to a projection.
    #[must_use]
    pub fn from_basic(basic_only: bool) -> Self {
        if basic_only {
            Self::BasicOnly
        } else {
            Self::Full
        }
    }
}

/// Completion-status filter applied to top-level tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    /// Keep every task.
    #[default]
    All,
    /// Keep completed tasks.
    Complete,
    /// Keep open tasks.
    Incomplete,
}

impl StatusFilter {
    /// All filters, in menu order.
    pub const ALL: [Self; 3] = [Self::All, Self::Complete, Self::Incomplete];

    /// Whether a record passes the filter.
    #[must_use]
    pub fn matches(self, record: &TaskRecord) -> bool {
        match self {
            Self::All => true,
            Self::Complete => record.completed,
            Self::Incomplete => !record.completed,
        }
    }

    /// Label used in output filenames.
    #[must_use]
    pub fn file_label(self) -> &'static str {
        match self {
            Self::All => "All_Tasks",
            Self::Complete => "Complete_Tasks",
            Self::Incomplete => "Incomplete_Tasks",
        }
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "All Tasks"),
            Self::Complete => write!(f, "Complete Tasks"),
            Self::Incomplete => write!(f, "Incomplete Tasks"),
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "complete" | "completed" => Ok(Self::Complete),
            "incomplete" | "open" => Ok(Self::Incomplete),
            _ => Err(anyhow::anyhow!(
                "Unknown status: {s}. Supported: all, complete, incomplete"
            )),
        }
    }
}

/// Logging verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Progress and results.
    #[default]
    Info,
    /// Everything, including each HTTP request.
    Debug,
    /// Problems only.
    Warning,
    /// Failures only.
    Error,
}

impl LogLevel {
    /// All levels, in menu order.
    pub const ALL: [Self; 4] = [Self::Info, Self::Debug, Self::Warning, Self::Error];

    /// `EnvFilter` directive for this level.
    #[must_use]
    pub fn directive(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Warning => "warn",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Debug => write!(f, "DEBUG"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            _ => Err(anyhow::anyhow!(
                "Unknown log level: {s}. Supported: info, debug, warning, error"
            )),
        }
    }
}

/// Which projects of the workspace are exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectScope {
    /// A single project.
    One(Project),
    /// Every project in the workspace, one output file each.
    All(Vec<Project>),
}

impl ProjectScope {
    /// Projects covered by this scope.
    #[must_use]
    pub fn projects(&self) -> &[Project] {
        match self {
            Self::One(project) => std::slice::from_ref(project),
            Self::All(projects) => projects,
        }
    }

    /// Resolve a scope from a project name or gid, or all projects.
    ///
    /// # Errors
    /// Returns [`ExportError::Selection`] if the project is unknown or no
    /// selection was given.
    pub fn resolve(
        projects: Vec<Project>,
        selector: Option<&str>,
        all: bool,
    ) -> ExportResult<Self> {
        if all {
            return Ok(Self::All(projects));
        }

        let selector = selector.ok_or_else(|| {
            ExportError::Selection("Specify --project <NAME|GID> or --all-projects".into())
        })?;

        projects
            .into_iter()
            .find(|p| p.gid == selector || p.name == selector)
            .map(Self::One)
            .ok_or_else(|| ExportError::Selection(format!("Project not found: {selector}")))
    }
}

/// Pick a workspace by name or gid; with no selector, the only workspace.
///
/// # Errors
/// Returns [`ExportError::Selection`] if nothing matches or the choice is
/// ambiguous.
pub fn find_workspace(
    mut workspaces: Vec<Workspace>,
    selector: Option<&str>,
) -> ExportResult<Workspace> {
    match selector {
        Some(selector) => workspaces
            .into_iter()
            .find(|w| w.gid == selector || w.name == selector)
            .ok_or_else(|| ExportError::Selection(format!("Workspace not found: {selector}"))),
        None if workspaces.len() == 1 => Ok(workspaces.remove(0)),
        None if workspaces.is_empty() => Err(ExportError::Selection(
            "No workspaces available for this access token".into(),
        )),
        None => Err(ExportError::Selection(format!(
            "{} workspaces available; specify --workspace <NAME|GID>",
            workspaces.len()
        ))),
    }
}

/// Immutable description of one export run.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Output format.
    pub format: ExportFormat,
    /// Workspace the projects belong to.
    pub workspace: Workspace,
    /// Projects to export.
    pub scope: ProjectScope,
    /// Completion-status filter.
    pub status: StatusFilter,
    /// Field projection.
    pub projection: FieldProjection,
    /// Verbosity the run was started with.
    pub log_level: LogLevel,
    /// Directory export files are written to.
    pub output_dir: PathBuf,
    /// Append status label and timestamp to filenames.
    pub timestamped_filenames: bool,
    /// Dump every exported task to the console.
    pub print_tasks: bool,
    /// Draw a progress bar while fetching.
    pub show_progress: bool,
    /// Sibling subtasks resolved concurrently.
    pub concurrency: usize,
    /// Maximum subtask nesting depth.
    pub max_depth: usize,
}

impl ExportConfig {
    /// Config with defaults for everything but the selection.
    #[must_use]
    pub fn new(workspace: Workspace, scope: ProjectScope) -> Self {
        Self {
            format: ExportFormat::default(),
            workspace,
            scope,
            status: StatusFilter::default(),
            projection: FieldProjection::default(),
            log_level: LogLevel::default(),
            output_dir: PathBuf::from("."),
            timestamped_filenames: true,
            print_tasks: false,
            show_progress: true,
            concurrency: DEFAULT_CONCURRENCY,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Whether the per-field console dump should be printed.
    #[must_use]
    pub fn should_print_tasks(&self) -> bool {
        self.print_tasks || self.log_level == LogLevel::Debug
    }
}
