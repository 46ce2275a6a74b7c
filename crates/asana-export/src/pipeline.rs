//! Export pipeline.
//!
//! Runs one export as a function of a [`Session`] and an [`ExportConfig`]:
//! for each selected project, aggregate every task, filter by completion
//! status, then write one file.
//!
//! A task that fails to aggregate (remote error, cycle, excessive depth) is
//! logged and recorded in the summary while the rest of the project carries
//! on. A project whose task list cannot be fetched is recorded and skipped.
//! Rejected credentials abort the run. A failed file write is recorded on
//! the project and makes the run report failure.
//!
//! Every project gets its own file: when two projects map to the same name
//! the later one is suffixed with its gid.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use asana::{Project, TaskSummary};
use chrono::Local;
use tracing::{error, info, warn};

use crate::aggregate::{AggregateOptions, Aggregator};
use crate::config::{ExportConfig, ExportFormat};
use crate::error::{ExportError, ExportResult};
use crate::export::{self, ExportTarget};
use crate::record::TaskRecord;
use crate::session::Session;
use crate::ui;

/// A top-level task that could not be aggregated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    /// Task identifier.
    pub gid: String,
    /// Task name from the project listing.
    pub name: String,
    /// Rendered error.
    pub error: String,
}

/// Result of exporting one project.
#[derive(Debug, Clone)]
pub struct ProjectOutcome {
    /// The project.
    pub project: Project,
    /// Records written after status filtering.
    pub exported: usize,
    /// Tasks skipped because aggregation failed.
    pub failures: Vec<TaskFailure>,
    /// Why the project's task list could not be fetched.
    pub fetch_error: Option<String>,
    /// File written, if any.
    pub output: Option<PathBuf>,
    /// Why the file could not be written.
    pub write_error: Option<String>,
}

/// How the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every task exported, every file written.
    Success,
    /// Some tasks or projects were skipped, but something was exported.
    Partial,
    /// A file could not be written, or no project could be fetched.
    Failed,
}

impl RunStatus {
    /// Process exit code for this status.
    #[must_use]
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Success => ExitCode::SUCCESS,
            Self::Failed => ExitCode::from(1),
            Self::Partial => ExitCode::from(2),
        }
    }
}

/// Result of a whole run.
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    /// One entry per exported project, in selection order.
    pub projects: Vec<ProjectOutcome>,
}

impl ExportSummary {
    /// Total records written.
    #[must_use]
    pub fn tasks_exported(&self) -> usize {
        self.projects.iter().map(|p| p.exported).sum()
    }

    /// Projects whose task list could not be fetched.
    #[must_use]
    pub fn projects_failed(&self) -> usize {
        self.projects
            .iter()
            .filter(|p| p.fetch_error.is_some())
            .count()
    }

    /// Total tasks skipped.
    #[must_use]
    pub fn tasks_failed(&self) -> usize {
        self.projects.iter().map(|p| p.failures.len()).sum()
    }

    /// Overall status.
    #[must_use]
    pub fn status(&self) -> RunStatus {
        let fetch_failures = self.projects_failed();

        if self.projects.iter().any(|p| p.write_error.is_some())
            || (fetch_failures > 0 && fetch_failures == self.projects.len())
        {
            RunStatus::Failed
        } else if fetch_failures > 0 || self.tasks_failed() > 0 {
            RunStatus::Partial
        } else {
            RunStatus::Success
        }
    }
}

/// Run the export described by `config`.
///
/// # Errors
/// Returns [`ExportError::Authentication`] if the credential is rejected.
pub async fn run_export(session: &Session, config: &ExportConfig) -> ExportResult<ExportSummary> {
    let mut summary = ExportSummary::default();
    let mut claimed = HashSet::new();

    for project in config.scope.projects() {
        let outcome = export_project(session, config, project, &mut claimed).await?;
        summary.projects.push(outcome);
    }

    info!(
        projects = summary.projects.len(),
        exported = summary.tasks_exported(),
        failed = summary.tasks_failed(),
        "Export finished"
    );
    Ok(summary)
}

async fn export_project(
    session: &Session,
    config: &ExportConfig,
    project: &Project,
    claimed: &mut HashSet<PathBuf>,
) -> ExportResult<ProjectOutcome> {
    info!(project = %project.name, "Fetching tasks");

    let tasks = match session.source().list_tasks(&project.gid).await {
        Ok(tasks) => tasks,
        Err(e) => {
            let e = ExportError::remote(format!("tasks of project {}", project.name), e);
            if !e.is_task_local() {
                return Err(e);
            }
            error!(project = %project.name, error = %e, "Skipping project");
            return Ok(ProjectOutcome {
                project: project.clone(),
                exported: 0,
                failures: Vec::new(),
                fetch_error: Some(e.to_string()),
                output: None,
                write_error: None,
            });
        }
    };

    let (records, failures) = aggregate_all(session, config, project, &tasks).await?;

    let mut records = records;
    records.retain(|record| config.status.matches(record));
    info!(
        project = %project.name,
        status = %config.status,
        kept = records.len(),
        "Applied status filter"
    );

    if config.should_print_tasks() {
        ui::print_task_dump(config.status, &records);
    }

    let target = if config.timestamped_filenames {
        ExportTarget::stamped(&project.name, config.status, Local::now().naive_local())
    } else {
        ExportTarget::plain(&project.name)
    };
    let target = claim_target(
        target,
        project,
        config.format,
        &config.output_dir,
        claimed,
    );

    let (output, write_error) = match export::write_export(
        &records,
        config.format,
        config.projection,
        &config.output_dir,
        &target,
    ) {
        Ok(path) => (Some(path), None),
        Err(e) => {
            error!(project = %project.name, error = %e, "Error exporting tasks");
            (None, Some(e.to_string()))
        }
    };

    Ok(ProjectOutcome {
        project: project.clone(),
        exported: if output.is_some() { records.len() } else { 0 },
        failures,
        fetch_error: None,
        output,
        write_error,
    })
}

/// Reserve a file name no earlier project of this run has used.
fn claim_target(
    target: ExportTarget,
    project: &Project,
    format: ExportFormat,
    dir: &Path,
    claimed: &mut HashSet<PathBuf>,
) -> ExportTarget {
    let mut candidate = target.clone();
    let mut attempt = 1;

    while !claimed.insert(dir.join(candidate.file_name(format))) {
        candidate = if attempt == 1 {
            target.with_suffix(&project.gid)
        } else {
            target.with_suffix(&format!("{}_{attempt}", project.gid))
        };
        attempt += 1;
    }

    if candidate != target {
        warn!(
            project = %project.name,
            file = %candidate.file_name(format),
            "Output name already used in this run; suffixed with project gid"
        );
    }
    candidate
}

async fn aggregate_all(
    session: &Session,
    config: &ExportConfig,
    project: &Project,
    tasks: &[TaskSummary],
) -> ExportResult<(Vec<TaskRecord>, Vec<TaskFailure>)> {
    let aggregator = Aggregator::new(
        session.source(),
        AggregateOptions {
            max_depth: config.max_depth,
            concurrency: config.concurrency,
        },
    );

    let progress = ui::task_progress(tasks.len(), &project.name, config.show_progress);
    let mut records = Vec::with_capacity(tasks.len());
    let mut failures = Vec::new();

    for task in tasks {
        match aggregator.aggregate(&task.gid).await {
            Ok(record) => records.push(record),
            Err(e) if e.is_task_local() => {
                warn!(gid = %task.gid, name = %task.name, error = %e, "Skipping task");
                failures.push(TaskFailure {
                    gid: task.gid.clone(),
                    name: task.name.clone(),
                    error: e.to_string(),
                });
            }
            Err(e) => {
                progress.abandon();
                return Err(e);
            }
        }
        progress.inc(1);
    }

    progress.finish_and_clear();
    Ok((records, failures))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(exported: usize, failures: usize, write_error: bool) -> ProjectOutcome {
        ProjectOutcome {
            project: Project {
                gid: "p".into(),
                name: "P".into(),
            },
            exported,
            fetch_error: None,
            failures: (0..failures)
                .map(|i| TaskFailure {
                    gid: i.to_string(),
                    name: format!("t{i}"),
                    error: "boom".into(),
                })
                .collect(),
            output: (!write_error).then(|| PathBuf::from("out.json")),
            write_error: write_error.then(|| "disk full".to_string()),
        }
    }

    #[test]
    fn test_summary_status() {
        let ok = ExportSummary {
            projects: vec![outcome(3, 0, false)],
        };
        assert_eq!(ok.status(), RunStatus::Success);
        assert_eq!(ok.tasks_exported(), 3);

        let partial = ExportSummary {
            projects: vec![outcome(3, 0, false), outcome(1, 2, false)],
        };
        assert_eq!(partial.status(), RunStatus::Partial);
        assert_eq!(partial.tasks_failed(), 2);

        let failed = ExportSummary {
            projects: vec![outcome(0, 1, true)],
        };
        assert_eq!(failed.status(), RunStatus::Failed);
    }

    #[test]
    fn test_fetch_failures_in_summary() {
        let mut skipped = outcome(0, 0, false);
        skipped.output = None;
        skipped.fetch_error = Some("API error: 500".into());

        let partial = ExportSummary {
            projects: vec![outcome(2, 0, false), skipped.clone()],
        };
        assert_eq!(partial.status(), RunStatus::Partial);
        assert_eq!(partial.projects_failed(), 1);

        let failed = ExportSummary {
            projects: vec![skipped],
        };
        assert_eq!(failed.status(), RunStatus::Failed);
    }

    #[test]
    fn test_claim_target_suffixes_duplicates() {
        let dir = Path::new("out");
        let mut claimed = HashSet::new();
        let alpha = Project {
            gid: "11".into(),
            name: "Alpha".into(),
        };
        let shouty = Project {
            gid: "22".into(),
            name: "alpha!".into(),
        };

        let first = claim_target(
            ExportTarget::plain(&alpha.name),
            &alpha,
            ExportFormat::Json,
            dir,
            &mut claimed,
        );
        let second = claim_target(
            ExportTarget::plain(&shouty.name),
            &shouty,
            ExportFormat::Json,
            dir,
            &mut claimed,
        );
        let third = claim_target(
            ExportTarget::plain(&shouty.name),
            &shouty,
            ExportFormat::Json,
            dir,
            &mut claimed,
        );

        assert_eq!(first.file_name(ExportFormat::Json), "asana_tasks_alpha.json");
        assert_eq!(second.file_name(ExportFormat::Json), "asana_tasks_alpha_22.json");
        assert_eq!(third.file_name(ExportFormat::Json), "asana_tasks_alpha_22_2.json");
    }

    #[test]
    fn test_empty_summary_is_success() {
        assert_eq!(ExportSummary::default().status(), RunStatus::Success);
    }
}
