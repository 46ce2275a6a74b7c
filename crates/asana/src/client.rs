//! Asana REST API client implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::models::{DataEnvelope, ErrorEnvelope, PageEnvelope};
use crate::traits::{AsanaError, Project, Story, Task, TaskSource, TaskSummary, Workspace};

/// Base URL for the Asana API.
pub const API_BASE_URL: &str = "https://app.asana.com/api/1.0";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Page size requested from list endpoints (Asana maximum).
const PAGE_LIMIT: &str = "100";

/// Opt-in header for the user task list behaviour.
const ASANA_ENABLE: (&str, &str) = ("asana-enable", "new_user_task_lists");

/// Asana API client authenticated with a personal access token.
#[derive(Clone)]
pub struct Asana {
    /// HTTP client.
    client: Client,
    /// Personal access token.
    access_token: String,
    /// API root, without trailing slash.
    base_url: String,
}

impl std::fmt::Debug for Asana {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Asana")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl Asana {
    /// Create a client against the public Asana API.
    ///
    /// # Errors
    /// Returns error if the token is empty or the HTTP client cannot be created.
    pub fn new(access_token: impl Into<String>) -> Result<Self, AsanaError> {
        Self::with_base_url(access_token, API_BASE_URL)
    }

    /// Create a client against a custom API root.
    ///
    /// # Errors
    /// Returns error if the token is empty or the HTTP client cannot be created.
    pub fn with_base_url(
        access_token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, AsanaError> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(AsanaError::Config("access token is empty".into()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            access_token: access_token.trim().to_string(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// API root this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make an authenticated GET request and return the raw response.
    async fn send(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, AsanaError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "GET request");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .header(ASANA_ENABLE.0, ASANA_ENABLE.1)
            .query(query)
            .send()
            .await?;

        Ok(response)
    }

    /// GET a single resource.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AsanaError> {
        let response = self.send(path, &[]).await?;
        let envelope: DataEnvelope<T> = Self::handle_response(response).await?;
        Ok(envelope.data)
    }

    /// GET every page of a list endpoint, concatenated in service order.
    async fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, AsanaError> {
        let mut items = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut query = vec![("limit", PAGE_LIMIT)];
            if let Some(offset) = offset.as_deref() {
                query.push(("offset", offset));
            }

            let response = self.send(path, &query).await?;
            let page: PageEnvelope<T> = Self::handle_response(response).await?;
            items.extend(page.data);

            match page.next_page {
                Some(next) => {
                    debug!(path, count = items.len(), "Fetching next page");
                    offset = Some(next.offset);
                }
                None => break,
            }
        }

        Ok(items)
    }

    /// Handle API response, parsing JSON or error.
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AsanaError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&text).map_err(|e| {
                warn!(error = %e, "Failed to parse response");
                AsanaError::Serialization(e)
            })
        } else if status == StatusCode::UNAUTHORIZED {
            Err(AsanaError::Unauthorized(ErrorEnvelope::message_or(&text)))
        } else if status == StatusCode::NOT_FOUND {
            Err(AsanaError::NotFound(ErrorEnvelope::message_or(&text)))
        } else {
            Err(AsanaError::Api {
                status: status.as_u16(),
                message: ErrorEnvelope::message_or(&text),
            })
        }
    }
}

#[async_trait]
impl TaskSource for Asana {
    async fn list_workspaces(&self) -> Result<Vec<Workspace>, AsanaError> {
        self.get_all("/workspaces").await
    }

    async fn list_projects(&self, workspace_gid: &str) -> Result<Vec<Project>, AsanaError> {
        self.get_all(&format!("/workspaces/{workspace_gid}/projects"))
            .await
    }

    async fn list_tasks(&self, project_gid: &str) -> Result<Vec<TaskSummary>, AsanaError> {
        self.get_all(&format!("/projects/{project_gid}/tasks")).await
    }

    async fn get_task(&self, task_gid: &str) -> Result<Task, AsanaError> {
        self.get(&format!("/tasks/{task_gid}")).await
    }

    async fn list_subtasks(&self, task_gid: &str) -> Result<Vec<TaskSummary>, AsanaError> {
        self.get_all(&format!("/tasks/{task_gid}/subtasks")).await
    }

    async fn list_stories(&self, task_gid: &str) -> Result<Vec<Story>, AsanaError> {
        self.get_all(&format!("/tasks/{task_gid}/stories")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_token() {
        let err = Asana::new("   ").unwrap_err();
        assert!(matches!(err, AsanaError::Config(_)));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = Asana::with_base_url("token", "http://localhost:9999/api/1.0/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:9999/api/1.0");
    }

    #[test]
    fn test_debug_hides_token() {
        let client = Asana::new("super-secret-token").unwrap();
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("super-secret-token"));
        assert!(rendered.contains("redacted"));
    }
}
