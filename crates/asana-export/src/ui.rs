//! Console output helpers.
//!
//! Provides consistent formatting for status lines, the fetch progress bar
//! and the per-task dump.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use crate::config::StatusFilter;
use crate::pipeline::ExportSummary;
use crate::record::TaskRecord;

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", "═".repeat(60).bright_black());
    println!("{}", title.cyan().bold());
    println!("{}", "═".repeat(60).bright_black());
    println!();
}

/// Print a step indicator with message.
pub fn print_step(message: &str) {
    println!("{} {}", "▶".cyan(), message.bold());
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message.yellow());
}

/// Print an error message.
pub fn print_error(message: &str) {
    println!("{} {}", "✗".red().bold(), message.red());
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print a key-value pair.
pub fn print_kv(key: &str, value: &str) {
    println!("  {} {}", format!("{key}:").bright_black(), value.green());
}

/// Progress bar for fetching the tasks of one project.
#[must_use]
pub fn task_progress(total: usize, project: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let style = ProgressStyle::with_template(
        "{msg} {bar:30.cyan/bright_black} {pos}/{len} tasks [{elapsed_precise}]",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▓░");

    let bar = ProgressBar::new(total as u64);
    bar.set_style(style);
    bar.set_message(format!("Exporting tasks from {project}"));
    bar
}

/// Print every field of every record.
pub fn print_task_dump(status: StatusFilter, records: &[TaskRecord]) {
    println!("{} {status}", "Task Status:".bold());

    for record in records {
        println!();
        match record.to_object() {
            Ok(fields) => {
                for (key, value) in &fields {
                    println!("{}: {}", key.bright_black(), render_value(value));
                }
            }
            Err(e) => print_warning(&format!("Cannot display task {}: {e}", record.gid)),
        }
    }
    println!();
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

/// Print the end-of-run summary.
pub fn print_summary(summary: &ExportSummary) {
    print_section("Export summary");

    for outcome in &summary.projects {
        match (&outcome.output, &outcome.write_error, &outcome.fetch_error) {
            (Some(path), _, _) => print_success(&format!(
                "{}: {} task(s) → {}",
                outcome.project.name,
                outcome.exported,
                path.display()
            )),
            (None, Some(error), _) | (None, None, Some(error)) => {
                print_error(&format!("{}: {error}", outcome.project.name));
            }
            (None, None, None) => {
                print_warning(&format!("{}: nothing written", outcome.project.name));
            }
        }

        for failure in &outcome.failures {
            print_kv(
                &format!("  failed {} ({})", failure.name, failure.gid),
                &failure.error,
            );
        }
    }

    println!();
    print_kv("Projects", &summary.projects.len().to_string());
    print_kv("Tasks exported", &summary.tasks_exported().to_string());
    print_kv("Projects skipped", &summary.projects_failed().to_string());
    print_kv("Tasks failed", &summary.tasks_failed().to_string());
}
