//! Week board model definitions

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::task::{Task, TaskChanges, TEMP_ID_PREFIX};

/// Identifier of a task created locally and not yet confirmed by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocalId(pub u64);

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", TEMP_ID_PREFIX, self.0)
    }
}

/// How the board refers to a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TaskKey {
    /// Optimistically created, waiting for the server id
    Pending {
        #[serde(rename = "localId")]
        local_id: LocalId,
    },
    /// Known to the store
    Persisted { id: Uuid },
}

impl TaskKey {
    pub fn pending(local_id: LocalId) -> Self {
        Self::Pending { local_id }
    }

    pub fn persisted(id: Uuid) -> Self {
        Self::Persisted { id }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// Server id, if the task has one
    pub fn id(&self) -> Option<Uuid> {
        match self {
            Self::Persisted { id } => Some(*id),
            Self::Pending { .. } => None,
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending { local_id } => local_id.fmt(f),
            Self::Persisted { id } => id.fmt(f),
        }
    }
}

/// A task as shown on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardTask {
    pub key: TaskKey,
    pub content: String,
    pub completed: bool,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BoardTask {
    /// A locally created task stamped with the client clock
    pub fn pending(local_id: LocalId, content: impl Into<String>, date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            key: TaskKey::pending(local_id),
            content: content.into(),
            completed: false,
            date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the completion flag
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    pub fn is_pending(&self) -> bool {
        self.key.is_pending()
    }

    /// An empty task is opened for editing straight away
    pub fn needs_edit(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Copy with `changes` merged over the current fields
    pub fn with_changes(&self, changes: &TaskChanges) -> Self {
        let mut merged = self.clone();
        if let Some(content) = &changes.content {
            merged.content = content.clone();
        }
        if let Some(completed) = changes.completed {
            merged.completed = completed;
        }
        if let Some(date) = changes.date {
            merged.date = date;
        }
        merged.updated_at = Utc::now();
        merged
    }

    /// Fields that differ from `other`, as an update
    pub fn diff(&self, other: &Task) -> TaskChanges {
        TaskChanges {
            content: (self.content != other.content).then(|| self.content.clone()),
            completed: (self.completed != other.completed).then_some(self.completed),
            date: (self.date != other.date).then_some(self.date),
        }
    }
}

impl From<Task> for BoardTask {
    fn from(task: Task) -> Self {
        Self {
            key: TaskKey::persisted(task.id),
            content: task.content,
            completed: task.completed,
            date: task.date,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// The tasks of one calendar day, in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayColumn {
    pub date: NaiveDate,
    pub tasks: Vec<BoardTask>,
}

impl DayColumn {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            tasks: Vec::new(),
        }
    }

    pub fn position(&self, key: &TaskKey) -> Option<usize> {
        self.tasks.iter().position(|t| t.key == *key)
    }

    pub fn get(&self, key: &TaskKey) -> Option<&BoardTask> {
        self.tasks.iter().find(|t| t.key == *key)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
