//! Request payload validation
//!
//! Raw request shapes are deserialized into the types below and checked once,
//! before anything reaches the store.

use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use super::model::{NewTask, TaskChanges};
use crate::calendar::{parse_date, DateRange};
use crate::{Error, Result};

/// Task body accepted by the create and update endpoints
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskPayload {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub date: Option<String>,
}

impl TaskPayload {
    /// Validate a create request.
    ///
    /// Missing content becomes an empty string, missing completion becomes
    /// `false` and a missing date falls back to today.
    pub fn into_new_task(self) -> Result<NewTask> {
        let today = Utc::now().date_naive();
        Ok(self.into_changes()?.into_new_task(today))
    }

    /// Validate a partial update; absent fields stay absent
    pub fn into_changes(self) -> Result<TaskChanges> {
        let date = self.date.as_deref().map(parse_date).transpose()?;

        Ok(TaskChanges {
            content: self.content.map(|c| c.trim().to_string()),
            completed: self.completed,
            date,
        })
    }
}

/// Query string of the list endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRangeQuery {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

impl DateRangeQuery {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start.to_string()),
            end: Some(end.to_string()),
        }
    }

    /// Parse both bounds into an inclusive day range
    pub fn into_range(self) -> Result<DateRange> {
        let (Some(start), Some(end)) = (non_blank(self.start), non_blank(self.end)) else {
            return Err(Error::InvalidInput(
                "Both start and end are required".to_string(),
            ));
        };

        DateRange::new(parse_date(&start)?, parse_date(&end)?)
    }
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.filter(|value| !value.trim().is_empty())
}
