//! Error types for the exporter.

use std::path::PathBuf;

use asana::AsanaError;
use thiserror::Error;

use crate::export::EncodeError;

/// Errors raised while loading credentials, aggregating tasks or writing
/// export files.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The remote service rejected the access token.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The stored secret could not be decrypted with the current key.
    #[error(
        "Stored access token failed its integrity check (tampered, or encrypted under a \
         different key); run `asana-export forget` and enter it again"
    )]
    Integrity,

    /// The key file exists but does not hold a usable key.
    #[error("Invalid key file {}: expected {expected} bytes, found {found}", .path.display())]
    InvalidKey {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    /// Encrypting the secret failed.
    #[error("Failed to encrypt access token")]
    Encryption,

    /// A remote call made while resolving a task failed.
    #[error("Failed to fetch {context}: {source}")]
    RemoteFetch {
        context: String,
        #[source]
        source: AsanaError,
    },

    /// The subtask graph loops back onto one of its ancestors.
    #[error("Subtask cycle detected at task {gid} (path: {})", .path.join(" -> "))]
    CycleDetected { gid: String, path: Vec<String> },

    /// The subtask tree is deeper than the configured limit.
    #[error("Subtask nesting exceeds {max_depth} levels at task {gid}")]
    DepthExceeded { gid: String, max_depth: usize },

    /// Writing an export file failed.
    #[error("Failed to write export file {}: {source}", .path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: EncodeError,
    },

    /// Local file access failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Interactive input failed or was rejected.
    #[error("Prompt failed: {0}")]
    Prompt(String),

    /// A requested workspace or project does not exist.
    #[error("{0}")]
    Selection(String),
}

/// Result alias for exporter operations.
pub type ExportResult<T> = Result<T, ExportError>;

impl ExportError {
    /// Wrap a remote failure, promoting rejected credentials to
    /// [`ExportError::Authentication`].
    pub fn remote(context: impl Into<String>, source: AsanaError) -> Self {
        match source {
            AsanaError::Unauthorized(message) => Self::Authentication(message),
            source => Self::RemoteFetch {
                context: context.into(),
                source,
            },
        }
    }

    /// Errors that only spoil the task being resolved; the rest of the
    /// batch can still be exported.
    #[must_use]
    pub fn is_task_local(&self) -> bool {
        matches!(
            self,
            Self::RemoteFetch { .. } | Self::CycleDetected { .. } | Self::DepthExceeded { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<dialoguer::Error> for ExportError {
    fn from(err: dialoguer::Error) -> Self {
        Self::Prompt(err.to_string())
    }
}
