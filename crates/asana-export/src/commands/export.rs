use std::path::PathBuf;

use anyhow::{Context, Result};
use asana::{Project, Workspace};
use asana_export::config::{find_workspace, DEFAULT_CONCURRENCY, DEFAULT_MAX_DEPTH};
use asana_export::{
    run_export, ExportConfig, ExportError, ExportFormat, ExportSummary, FieldProjection,
    ProjectScope, Session, StatusFilter,
};
use asana_export::ui;
use clap::Args;
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm, Select};

use super::GlobalOptions;

/// Menu entry that exports every project of the workspace.
const ALL_PROJECTS: &str = "All Projects";

/// Export project tasks to YAML, CSV or JSON
#[derive(Args, Debug, Default)]
pub struct ExportCommand {
    /// Output format (yaml, csv, json)
    #[arg(short, long, value_name = "FORMAT")]
    format: Option<String>,

    /// Workspace name or gid
    #[arg(short, long, value_name = "NAME|GID")]
    workspace: Option<String>,

    /// Project name or gid
    #[arg(short, long, value_name = "NAME|GID", conflicts_with = "all_projects")]
    project: Option<String>,

    /// Export every project of the workspace
    #[arg(long)]
    all_projects: bool,

    /// Completion status (all, complete, incomplete)
    #[arg(short, long, value_name = "STATUS")]
    status: Option<String>,

    /// Export only basic fields (name, dates, notes, assignee, comments)
    #[arg(long)]
    basic_fields: bool,

    /// Directory to write export files to
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Print every exported task to the console
    #[arg(long)]
    print_tasks: bool,

    /// Name files after the project only, without status and timestamp
    #[arg(long)]
    no_timestamp: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Sibling subtasks fetched concurrently
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Maximum subtask nesting depth
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,
}

impl ExportCommand {
    pub async fn run(&self, options: &GlobalOptions) -> Result<ExportSummary> {
        ui::print_section("Asana Task Export");

        let secret = options.resolve_secret()?;
        let session = Session::connect(&secret, &options.api_url)?;

        let config = if options.non_interactive {
            self.resolve_config(&session, options).await?
        } else {
            self.interactive_config(&session, options).await?
        };

        print_config(&config);

        let summary = run_export(&session, &config).await?;
        ui::print_summary(&summary);
        Ok(summary)
    }

    /// Build the config from flags alone.
    async fn resolve_config(
        &self,
        session: &Session,
        options: &GlobalOptions,
    ) -> Result<ExportConfig> {
        let format = match &self.format {
            Some(f) => f.parse()?,
            None => ExportFormat::default(),
        };
        let status = match &self.status {
            Some(s) => s.parse()?,
            None => StatusFilter::default(),
        };

        let workspace = find_workspace(session.workspaces().await?, self.workspace.as_deref())?;
        let projects = session.projects(&workspace).await?;
        let scope = ProjectScope::resolve(projects, self.project.as_deref(), self.all_projects)?;

        Ok(self.finish(
            workspace,
            scope,
            format,
            status,
            FieldProjection::from_basic(self.basic_fields),
            options,
        ))
    }

    /// Ask for every choice not already given as a flag.
    async fn interactive_config(
        &self,
        session: &Session,
        options: &GlobalOptions,
    ) -> Result<ExportConfig> {
        let theme = ColorfulTheme::default();

        let format = match &self.format {
            Some(f) => f.parse()?,
            None => {
                let labels: Vec<String> =
                    ExportFormat::ALL.iter().map(ToString::to_string).collect();
                let idx = Select::with_theme(&theme)
                    .with_prompt("Select export format")
                    .default(0)
                    .items(&labels)
                    .interact()?;
                ExportFormat::ALL[idx]
            }
        };

        ui::print_step("Fetching workspaces");
        let workspaces = session.workspaces().await?;
        let workspace = match self.workspace.as_deref() {
            Some(selector) => find_workspace(workspaces, Some(selector))?,
            None => select_workspace(&theme, workspaces)?,
        };

        ui::print_step(&format!("Fetching projects in {}", workspace.name));
        let projects = session.projects(&workspace).await?;
        let scope = if self.all_projects || self.project.is_some() {
            ProjectScope::resolve(projects, self.project.as_deref(), self.all_projects)?
        } else {
            select_projects(&theme, projects)?
        };

        let status = match &self.status {
            Some(s) => s.parse()?,
            None => {
                let labels: Vec<String> =
                    StatusFilter::ALL.iter().map(ToString::to_string).collect();
                let idx = Select::with_theme(&theme)
                    .with_prompt("Select task status to export")
                    .default(0)
                    .items(&labels)
                    .interact()?;
                StatusFilter::ALL[idx]
            }
        };

        let basic_only = self.basic_fields
            || Confirm::with_theme(&theme)
                .with_prompt("Do you want to export only basic fields (e.g., name, but not GID)?")
                .default(false)
                .interact()?;

        Ok(self.finish(
            workspace,
            scope,
            format,
            status,
            FieldProjection::from_basic(basic_only),
            options,
        ))
    }

    fn finish(
        &self,
        workspace: Workspace,
        scope: ProjectScope,
        format: ExportFormat,
        status: StatusFilter,
        projection: FieldProjection,
        options: &GlobalOptions,
    ) -> ExportConfig {
        ExportConfig {
            format,
            status,
            projection,
            log_level: options.log_level,
            output_dir: self.output_dir.clone().unwrap_or_else(|| PathBuf::from(".")),
            timestamped_filenames: !self.no_timestamp,
            print_tasks: self.print_tasks,
            show_progress: !self.no_progress,
            concurrency: self.concurrency.unwrap_or(DEFAULT_CONCURRENCY).max(1),
            max_depth: self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
            ..ExportConfig::new(workspace, scope)
        }
    }
}

fn select_workspace(theme: &ColorfulTheme, mut workspaces: Vec<Workspace>) -> Result<Workspace> {
    if workspaces.is_empty() {
        return Err(ExportError::Selection(
            "No workspaces available for this access token".into(),
        )
        .into());
    }

    let names: Vec<&str> = workspaces.iter().map(|w| w.name.as_str()).collect();
    let idx = Select::with_theme(theme)
        .with_prompt("Select a workspace")
        .default(0)
        .items(&names)
        .interact()?;

    Ok(workspaces.swap_remove(idx))
}

fn select_projects(theme: &ColorfulTheme, mut projects: Vec<Project>) -> Result<ProjectScope> {
    if projects.is_empty() {
        return Err(ExportError::Selection("No projects in this workspace".into()).into());
    }

    let mut names: Vec<&str> = projects.iter().map(|p| p.name.as_str()).collect();
    names.push(ALL_PROJECTS);

    let idx = Select::with_theme(theme)
        .with_prompt("Select a project")
        .default(0)
        .items(&names)
        .interact()
        .context("Project selection failed")?;

    if idx == projects.len() {
        Ok(ProjectScope::All(projects))
    } else {
        Ok(ProjectScope::One(projects.swap_remove(idx)))
    }
}

fn print_config(config: &ExportConfig) {
    println!();
    println!("{}", "Export configuration".bold());
    ui::print_kv("Workspace", &config.workspace.name);
    match &config.scope {
        ProjectScope::One(project) => ui::print_kv("Project", &project.name),
        ProjectScope::All(projects) => {
            ui::print_kv("Projects", &format!("{ALL_PROJECTS} ({})", projects.len()));
        }
    }
    ui::print_kv("Format", &config.format.to_string());
    ui::print_kv("Status", &config.status.to_string());
    ui::print_kv(
        "Fields",
        match config.projection {
            FieldProjection::Full => "all",
            FieldProjection::BasicOnly => "basic",
        },
    );
    ui::print_kv("Output", &config.output_dir.display().to_string());
    println!();
}
