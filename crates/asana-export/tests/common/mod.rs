//! In-memory task source shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use asana::{AsanaError, Project, Story, Task, TaskSource, TaskSummary, UserRef, Workspace};
use async_trait::async_trait;
use serde_json::json;

#[derive(Default)]
pub struct FakeSource {
    pub workspaces: Vec<Workspace>,
    pub projects: HashMap<String, Vec<Project>>,
    pub project_tasks: HashMap<String, Vec<String>>,
    pub tasks: HashMap<String, Task>,
    pub children: HashMap<String, Vec<String>>,
    pub stories: HashMap<String, Vec<Story>>,
    pub broken: HashSet<String>,
    pub unauthorized: bool,
    pub detail_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task with the given completion state.
    pub fn task(mut self, gid: &str, completed: bool) -> Self {
        let task: Task = serde_json::from_value(json!({
            "gid": gid,
            "name": format!("Task {gid}"),
            "created_at": "2024-03-01T09:30:00.000Z",
            "due_on": null,
            "notes": "",
            "assignee": {"gid": "u1", "name": "Ada"},
            "completed": completed,
            "resource_type": "task"
        }))
        .expect("valid task fixture");
        self.tasks.insert(gid.to_string(), task);
        self
    }

    pub fn child(mut self, parent: &str, child: &str) -> Self {
        self.children
            .entry(parent.to_string())
            .or_default()
            .push(child.to_string());
        self
    }

    pub fn comment(mut self, gid: &str, text: &str) -> Self {
        self.stories
            .entry(gid.to_string())
            .or_default()
            .push(story(gid, "comment_added", text));
        self
    }

    pub fn activity(mut self, gid: &str, text: &str) -> Self {
        self.stories
            .entry(gid.to_string())
            .or_default()
            .push(story(gid, "assigned", text));
        self
    }

    pub fn project(mut self, workspace: &str, gid: &str, name: &str, tasks: &[&str]) -> Self {
        if !self.workspaces.iter().any(|w| w.gid == workspace) {
            self.workspaces.push(Workspace {
                gid: workspace.to_string(),
                name: format!("Workspace {workspace}"),
            });
        }
        self.projects
            .entry(workspace.to_string())
            .or_default()
            .push(Project {
                gid: gid.to_string(),
                name: name.to_string(),
            });
        self.project_tasks.insert(
            gid.to_string(),
            tasks.iter().map(|t| (*t).to_string()).collect(),
        );
        self
    }

    pub fn broken(mut self, gid: &str) -> Self {
        self.broken.insert(gid.to_string());
        self
    }

    /// Full tree of the given depth and fan-out rooted at `root`.
    pub fn tree(mut self, root: &str, depth: u32, fan_out: usize) -> Self {
        self = self.task(root, false);
        if depth > 1 {
            for i in 0..fan_out {
                let child = format!("{root}.{i}");
                self = self.child(root, &child).tree(&child, depth - 1, fan_out);
            }
        }
        self
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    fn check(&self, gid: &str) -> Result<(), AsanaError> {
        if self.unauthorized {
            return Err(AsanaError::Unauthorized("Not Authorized".into()));
        }
        if self.broken.contains(gid) {
            return Err(AsanaError::Api {
                status: 500,
                message: "Server Error".into(),
            });
        }
        Ok(())
    }

    fn summaries(&self, gids: &[String]) -> Vec<TaskSummary> {
        gids.iter()
            .map(|gid| TaskSummary {
                gid: gid.clone(),
                name: format!("Task {gid}"),
            })
            .collect()
    }
}

fn story(gid: &str, subtype: &str, text: &str) -> Story {
    Story {
        gid: format!("{gid}-{text}"),
        resource_type: Some("story".into()),
        resource_subtype: Some(subtype.into()),
        created_at: None,
        created_by: Some(UserRef {
            gid: Some("u2".into()),
            name: Some("Grace".into()),
        }),
        text: Some(text.into()),
    }
}

#[async_trait]
impl TaskSource for FakeSource {
    async fn list_workspaces(&self) -> Result<Vec<Workspace>, AsanaError> {
        self.check("")?;
        Ok(self.workspaces.clone())
    }

    async fn list_projects(&self, workspace_gid: &str) -> Result<Vec<Project>, AsanaError> {
        self.check(workspace_gid)?;
        Ok(self.projects.get(workspace_gid).cloned().unwrap_or_default())
    }

    async fn list_tasks(&self, project_gid: &str) -> Result<Vec<TaskSummary>, AsanaError> {
        self.check(project_gid)?;
        Ok(self.summaries(
            self.project_tasks
                .get(project_gid)
                .map_or(&[][..], Vec::as_slice),
        ))
    }

    async fn get_task(&self, task_gid: &str) -> Result<Task, AsanaError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.check(task_gid)?;
        self.tasks
            .get(task_gid)
            .cloned()
            .ok_or_else(|| AsanaError::NotFound(task_gid.to_string()))
    }

    async fn list_subtasks(&self, task_gid: &str) -> Result<Vec<TaskSummary>, AsanaError> {
        self.check(task_gid)?;
        Ok(self.summaries(self.children.get(task_gid).map_or(&[][..], Vec::as_slice)))
    }

    async fn list_stories(&self, task_gid: &str) -> Result<Vec<Story>, AsanaError> {
        self.check(task_gid)?;
        Ok(self.stories.get(task_gid).cloned().unwrap_or_default())
    }
}
