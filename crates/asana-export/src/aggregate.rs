//! Task aggregation.
//!
//! Resolves one task into a [`TaskRecord`]: its detail, its whole subtask
//! tree and its user comments. Every level costs three round trips (detail,
//! subtask list, story feed); nothing is batched or cached.
//!
//! The remote source is not trusted to be acyclic. The chain of ancestors is
//! threaded through the recursion so a subtask pointing back at one of them is
//! reported as [`ExportError::CycleDetected`], and nesting beyond
//! [`AggregateOptions::max_depth`] as [`ExportError::DepthExceeded`].

use asana::{Story, Task, TaskSource};
use futures::future::BoxFuture;
use futures::{stream, FutureExt, StreamExt, TryStreamExt};
use tracing::{debug, trace};

use crate::config::{DEFAULT_CONCURRENCY, DEFAULT_MAX_DEPTH};
use crate::error::{ExportError, ExportResult};
use crate::record::{CommentRecord, TaskRecord};

/// Story type of feed entries.
const STORY_TYPE: &str = "story";

/// Story subtype of user-authored comments.
const COMMENT_SUBTYPE: &str = "comment_added";

/// Creator shown for comments whose author is unknown.
const UNKNOWN_CREATOR: &str = "Unknown";

/// Fields owned by the record itself; dropped from passthrough extras.
const RESERVED_FIELDS: [&str; 2] = ["subtasks", "comments"];

/// Limits applied while walking a subtask tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Maximum nesting depth below the root task.
    pub max_depth: usize,
    /// Sibling subtasks resolved at once. `1` is strictly sequential.
    pub concurrency: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Builds fully-resolved task records from a [`TaskSource`].
pub struct Aggregator<'a> {
    source: &'a dyn TaskSource,
    options: AggregateOptions,
}

impl<'a> Aggregator<'a> {
    /// Create an aggregator over `source`.
    pub fn new(source: &'a dyn TaskSource, options: AggregateOptions) -> Self {
        Self { source, options }
    }

    /// Resolve `gid` with its full subtask tree and comments.
    ///
    /// # Errors
    /// Any failed remote call aborts the whole task. Also fails with
    /// [`ExportError::CycleDetected`] or [`ExportError::DepthExceeded`] when
    /// the subtask graph is not a reasonably shallow tree.
    pub async fn aggregate(&self, gid: &str) -> ExportResult<TaskRecord> {
        self.resolve(gid.to_string(), Vec::new()).await
    }

    fn resolve(
        &self,
        gid: String,
        ancestors: Vec<String>,
    ) -> BoxFuture<'_, ExportResult<TaskRecord>> {
        async move {
            if ancestors.contains(&gid) {
                let mut path = ancestors;
                path.push(gid.clone());
                return Err(ExportError::CycleDetected { gid, path });
            }
            if ancestors.len() > self.options.max_depth {
                return Err(ExportError::DepthExceeded {
                    gid,
                    max_depth: self.options.max_depth,
                });
            }

            trace!(gid = %gid, depth = ancestors.len(), "Resolving task");

            let detail = self
                .source
                .get_task(&gid)
                .await
                .map_err(|e| ExportError::remote(format!("task {gid}"), e))?;

            let children = self
                .source
                .list_subtasks(&gid)
                .await
                .map_err(|e| ExportError::remote(format!("subtasks of task {gid}"), e))?;

            let mut path = ancestors;
            path.push(gid.clone());
            let path = &path;

            let subtasks: Vec<TaskRecord> = stream::iter(children)
                .map(|child| self.resolve(child.gid, path.clone()))
                .buffered(self.options.concurrency.max(1))
                .try_collect()
                .await?;

            let stories = self
                .source
                .list_stories(&gid)
                .await
                .map_err(|e| ExportError::remote(format!("stories of task {gid}"), e))?;
            let comments = user_comments(stories);

            debug!(
                gid = %gid,
                subtasks = subtasks.len(),
                comments = comments.len(),
                "Resolved task"
            );

            Ok(build_record(detail, subtasks, comments))
        }
        .boxed()
    }
}

/// Whether a story is a user-authored comment rather than system activity.
#[must_use]
pub fn is_user_comment(story: &Story) -> bool {
    story.resource_type.as_deref() == Some(STORY_TYPE)
        && story.resource_subtype.as_deref() == Some(COMMENT_SUBTYPE)
}

/// Keep only user comments, in feed order.
#[must_use]
pub fn user_comments(stories: Vec<Story>) -> Vec<CommentRecord> {
    stories
        .into_iter()
        .filter(is_user_comment)
        .map(|story| CommentRecord {
            creator: story
                .created_by
                .and_then(|user| user.name)
                .unwrap_or_else(|| UNKNOWN_CREATOR.to_string()),
            created_at: story.created_at,
            text: story.text.unwrap_or_default(),
        })
        .collect()
}

fn build_record(
    detail: Task,
    subtasks: Vec<TaskRecord>,
    comments: Vec<CommentRecord>,
) -> TaskRecord {
    let mut extra = detail.other;
    for field in RESERVED_FIELDS {
        extra.remove(field);
    }

    TaskRecord {
        gid: detail.gid,
        name: detail.name,
        created_at: detail.created_at,
        due_on: detail.due_on,
        notes: detail.notes,
        assignee: detail.assignee.and_then(|user| user.name),
        completed: detail.completed,
        extra,
        subtasks,
        comments,
    }
}
