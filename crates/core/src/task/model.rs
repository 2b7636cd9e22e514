//! Task model definitions

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::{iso_millis, midnight_iso};
use crate::Error;

/// Prefix of ids handed out to tasks that exist only on a client
pub const TEMP_ID_PREFIX: &str = "temp_";

/// A task pinned to a calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub content: String,
    pub completed: bool,
    #[serde(with = "midnight_iso")]
    pub date: NaiveDate,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new, not yet completed task on `date`
    pub fn new(content: impl Into<String>, date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
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

    /// Apply a set of changes in place
    pub fn apply(&mut self, changes: &TaskChanges) {
        if let Some(content) = &changes.content {
            self.content = content.clone();
        }
        if let Some(completed) = changes.completed {
            self.completed = completed;
        }
        if let Some(date) = changes.date {
            self.date = date;
        }
    }
}

impl From<NewTask> for Task {
    fn from(new: NewTask) -> Self {
        Task::new(new.content, new.date).with_completed(new.completed)
    }
}

/// Fields of a task about to be created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub content: String,
    pub date: NaiveDate,
    pub completed: bool,
}

impl NewTask {
    pub fn new(content: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            content: content.into(),
            date,
            completed: false,
        }
    }
}

/// A partial update; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl TaskChanges {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn date(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.completed.is_none() && self.date.is_none()
    }

    /// Turn the changes into a full record, filling gaps with defaults
    pub fn into_new_task(self, default_date: NaiveDate) -> NewTask {
        NewTask {
            content: self.content.unwrap_or_default(),
            date: self.date.unwrap_or(default_date),
            completed: self.completed.unwrap_or(false),
        }
    }
}

/// How a request addresses a task
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskRef {
    /// A record the store knows about
    Persisted(Uuid),
    /// A client-side placeholder that was never stored
    Temporary(String),
}

impl TaskRef {
    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }
}

impl FromStr for TaskRef {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.starts_with(TEMP_ID_PREFIX) {
            return Ok(Self::Temporary(raw.to_string()));
        }
        Uuid::parse_str(raw)
            .map(Self::Persisted)
            .map_err(|_| Error::InvalidInput(format!("Invalid task ID: {}", raw)))
    }
}

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Persisted(id) => write!(f, "{}", id),
            Self::Temporary(raw) => f.write_str(raw),
        }
    }
}
