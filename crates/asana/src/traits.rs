//! Task source trait and common types for the Asana API.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur while talking to the task service.
#[derive(Error, Debug)]
pub enum AsanaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The access token was rejected.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Response body could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AsanaError {
    /// Whether the error means the credential itself is bad.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// A workspace the token has access to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// Global identifier.
    pub gid: String,
    /// Display name.
    pub name: String,
}

/// A project inside a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Global identifier.
    pub gid: String,
    /// Display name.
    pub name: String,
}

/// Compact task reference as returned by list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    /// Global identifier.
    pub gid: String,
    /// Task name.
    #[serde(default)]
    pub name: String,
}

/// Compact user reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// Global identifier.
    #[serde(default)]
    pub gid: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Full task detail.
///
/// The typed fields are the ones the exporter reasons about; everything else
/// the API returns is kept verbatim in `other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Global identifier.
    pub gid: String,
    /// Task name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Due date, if any.
    #[serde(default)]
    pub due_on: Option<NaiveDate>,
    /// Free-text notes.
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    /// Assigned user, if any.
    #[serde(default)]
    pub assignee: Option<UserRef>,
    /// Completion flag.
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
    /// Remaining fields of the detail record.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// One entry of a task's story feed.
///
/// Stories mix user comments with system activity ("assigned", "moved", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    /// Global identifier.
    pub gid: String,
    /// Resource type, `"story"` for feed entries.
    #[serde(default)]
    pub resource_type: Option<String>,
    /// Story subtype, e.g. `"comment_added"` or `"assigned"`.
    #[serde(default)]
    pub resource_subtype: Option<String>,
    /// When the story was created.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Author.
    #[serde(default)]
    pub created_by: Option<UserRef>,
    /// Plain-text body.
    #[serde(default)]
    pub text: Option<String>,
}

/// Treat an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read access to workspaces, projects, tasks and their story feeds.
///
/// Implementations must return list results in the order the service
/// returned them.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Enumerate workspaces visible to the credential.
    async fn list_workspaces(&self) -> Result<Vec<Workspace>, AsanaError>;

    /// Enumerate projects in a workspace.
    async fn list_projects(&self, workspace_gid: &str) -> Result<Vec<Project>, AsanaError>;

    /// Enumerate top-level tasks of a project.
    async fn list_tasks(&self, project_gid: &str) -> Result<Vec<TaskSummary>, AsanaError>;

    /// Fetch full task detail.
    async fn get_task(&self, task_gid: &str) -> Result<Task, AsanaError>;

    /// Enumerate the immediate subtasks of a task.
    async fn list_subtasks(&self, task_gid: &str) -> Result<Vec<TaskSummary>, AsanaError>;

    /// Enumerate the story feed of a task.
    async fn list_stories(&self, task_gid: &str) -> Result<Vec<Story>, AsanaError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_keeps_unknown_fields() {
        let json = r#"{
            "gid": "42",
            "name": "Write report",
            "created_at": "2024-03-01T09:30:00.000Z",
            "due_on": "2024-03-15",
            "notes": "",
            "assignee": {"gid": "7", "name": "Ada"},
            "completed": false,
            "resource_type": "task",
            "tags": []
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.gid, "42");
        assert_eq!(task.due_on, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(task.assignee.unwrap().name.as_deref(), Some("Ada"));
        assert_eq!(task.other.get("resource_type"), Some(&Value::from("task")));
        assert!(task.other.contains_key("tags"));
        assert!(!task.other.contains_key("gid"));
    }

    #[test]
    fn test_task_tolerates_missing_fields() {
        let task: Task =
            serde_json::from_str(r#"{"gid": "1", "assignee": null, "notes": null}"#).unwrap();
        assert_eq!(task.name, "");
        assert_eq!(task.notes, "");
        assert!(task.created_at.is_none());
        assert!(task.assignee.is_none());
        assert!(!task.completed);
    }

    #[test]
    fn test_null_completed_is_open() {
        let task: Task =
            serde_json::from_str(r#"{"gid": "1", "name": null, "completed": null}"#).unwrap();
        assert!(!task.completed);
        assert_eq!(task.name, "");
    }

    #[test]
    fn test_story_without_classification() {
        let story: Story = serde_json::from_str(r#"{"gid": "s1", "text": "hi"}"#).unwrap();
        assert!(story.resource_type.is_none());
        assert!(story.resource_subtype.is_none());
    }

    #[test]
    fn test_unauthorized_predicate() {
        assert!(AsanaError::Unauthorized("bad token".into()).is_unauthorized());
        assert!(!AsanaError::NotFound("x".into()).is_unauthorized());
    }
}
