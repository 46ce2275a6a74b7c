//! Authenticated session for one run.

use std::sync::Arc;

use asana::{Asana, Project, TaskSource, Workspace};
use tracing::debug;

use crate::error::{ExportError, ExportResult};
use crate::vault::Secret;

/// One authenticated connection to the task service, passed explicitly to
/// everything that talks to it.
#[derive(Clone)]
pub struct Session {
    source: Arc<dyn TaskSource>,
}

impl Session {
    /// Wrap an existing task source.
    pub fn new(source: Arc<dyn TaskSource>) -> Self {
        Self { source }
    }

    /// Open a session against the Asana API at `api_url`.
    ///
    /// # Errors
    /// Returns error if the secret is not valid text or the HTTP client cannot
    /// be built.
    pub fn connect(secret: &Secret, api_url: &str) -> ExportResult<Self> {
        let token = secret.expose_str()?;
        let client = Asana::with_base_url(token, api_url)
            .map_err(|e| ExportError::remote("API client", e))?;
        debug!(api_url, "Opened Asana session");
        Ok(Self::new(Arc::new(client)))
    }

    /// The underlying task source.
    #[must_use]
    pub fn source(&self) -> &dyn TaskSource {
        self.source.as_ref()
    }

    /// Workspaces visible to the credential.
    ///
    /// # Errors
    /// Returns [`ExportError::Authentication`] if the token is rejected.
    pub async fn workspaces(&self) -> ExportResult<Vec<Workspace>> {
        self.source
            .list_workspaces()
            .await
            .map_err(|e| ExportError::remote("workspaces", e))
    }

    /// Projects in `workspace`.
    ///
    /// # Errors
    /// Returns [`ExportError::Authentication`] if the token is rejected.
    pub async fn projects(&self, workspace: &Workspace) -> ExportResult<Vec<Project>> {
        self.source
            .list_projects(&workspace.gid)
            .await
            .map_err(|e| ExportError::remote(format!("projects of {}", workspace.name), e))
    }
}
