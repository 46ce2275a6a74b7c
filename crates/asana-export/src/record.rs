//! Denormalised task records produced by the aggregator.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Separator between creator and timestamp in `creator_time`.
const CREATOR_TIME_SEPARATOR: &str = " - ";

/// A task with its full subtask tree and comment thread resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Remote identifier.
    pub gid: String,
    /// Task name.
    pub name: String,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Due date.
    pub due_on: Option<NaiveDate>,
    /// Free-text notes.
    pub notes: String,
    /// Assignee display name.
    pub assignee: Option<String>,
    /// Completion flag.
    pub completed: bool,
    /// Every other field of the remote detail record.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Resolved subtasks, in remote order.
    pub subtasks: Vec<TaskRecord>,
    /// User comments, oldest first.
    pub comments: Vec<CommentRecord>,
}

impl TaskRecord {
    /// Number of records in this tree, including the root.
    #[must_use]
    pub fn tree_size(&self) -> usize {
        1 + self.subtasks.iter().map(TaskRecord::tree_size).sum::<usize>()
    }

    /// Convert to a JSON object for projection and serialization.
    ///
    /// # Errors
    /// Returns error if a field cannot be represented as JSON.
    pub fn to_object(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(serde::ser::Error::custom(format!(
                "task record serialized to {other}, expected an object"
            ))),
        }
    }
}

/// A user-authored comment on a task.
///
/// Serialized as `{ "creator_time": "<creator> - <timestamp>", "text": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "CommentWire", try_from = "CommentWire")]
pub struct CommentRecord {
    /// Creator display name.
    pub creator: String,
    /// When the comment was posted.
    pub created_at: Option<DateTime<Utc>>,
    /// Comment body.
    pub text: String,
}

impl CommentRecord {
    /// The composite `"<creator> - <timestamp>"` label.
    #[must_use]
    pub fn creator_time(&self) -> String {
        let time = self
            .created_at
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default();
        format!("{}{CREATOR_TIME_SEPARATOR}{time}", self.creator)
    }
}

#[derive(Serialize, Deserialize)]
struct CommentWire {
    creator_time: String,
    text: String,
}

impl From<CommentRecord> for CommentWire {
    fn from(comment: CommentRecord) -> Self {
        Self {
            creator_time: comment.creator_time(),
            text: comment.text,
        }
    }
}

impl TryFrom<CommentWire> for CommentRecord {
    type Error = String;

    fn try_from(wire: CommentWire) -> Result<Self, Self::Error> {
        // Creator names may contain the separator; timestamps never do.
        let (creator, time) = wire
            .creator_time
            .rsplit_once(CREATOR_TIME_SEPARATOR)
            .ok_or_else(|| format!("malformed creator_time: {:?}", wire.creator_time))?;

        let created_at = if time.is_empty() {
            None
        } else {
            let parsed = DateTime::parse_from_rfc3339(time)
                .map_err(|e| format!("bad timestamp in creator_time {time:?}: {e}"))?;
            Some(parsed.with_timezone(&Utc))
        };

        Ok(Self {
            creator: creator.to_string(),
            created_at,
            text: wire.text,
        })
    }
}
