//! Seven-column week state and its transitions

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::model::{BoardTask, DayColumn, TaskKey};
use crate::calendar::{start_of_week, DateRange};
use crate::task::Task;
use crate::{Error, Result};

/// One Monday-start week of day columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekData {
    pub columns: [DayColumn; 7],
}

impl WeekData {
    /// Empty columns for the week containing `anchor`
    pub fn empty(anchor: NaiveDate) -> Self {
        let monday = start_of_week(anchor);
        Self {
            columns: std::array::from_fn(|i| DayColumn::new(monday + Duration::days(i as i64))),
        }
    }

    /// Bucket server records into the week containing `anchor`.
    ///
    /// Records keep their relative order; records outside the week are
    /// dropped.
    pub fn from_tasks(anchor: NaiveDate, tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut week = Self::empty(anchor);
        for task in tasks {
            let date = task.date;
            if !week.insert(BoardTask::from(task), None) {
                debug!("Ignoring task dated {} outside the displayed week", date);
            }
        }
        week
    }

    pub fn start(&self) -> NaiveDate {
        self.columns[0].date
    }

    pub fn end(&self) -> NaiveDate {
        self.columns[6].date
    }

    pub fn range(&self) -> DateRange {
        DateRange::week_of(self.start())
    }

    pub fn column(&self, date: NaiveDate) -> Option<&DayColumn> {
        self.columns.iter().find(|c| c.date == date)
    }

    fn column_mut(&mut self, date: NaiveDate) -> Option<&mut DayColumn> {
        self.columns.iter_mut().find(|c| c.date == date)
    }

    /// Column index and position of a task
    pub fn locate(&self, key: &TaskKey) -> Option<(usize, usize)> {
        self.columns
            .iter()
            .enumerate()
            .find_map(|(ci, column)| column.position(key).map(|ti| (ci, ti)))
    }

    pub fn get(&self, key: &TaskKey) -> Option<&BoardTask> {
        self.columns.iter().find_map(|c| c.get(key))
    }

    pub fn task_count(&self) -> usize {
        self.columns.iter().map(DayColumn::len).sum()
    }

    /// Insert into the column whose date equals the task's date.
    ///
    /// `index` is clamped to the column length; `None` appends. Returns
    /// `false` when no column carries that date.
    pub fn insert(&mut self, task: BoardTask, index: Option<usize>) -> bool {
        let Some(column) = self.column_mut(task.date) else {
            return false;
        };
        let index = index.unwrap_or(column.tasks.len()).min(column.tasks.len());
        column.tasks.insert(index, task);
        true
    }

    /// Remove a task from every column, returning the first copy found
    pub fn remove(&mut self, key: &TaskKey) -> Option<BoardTask> {
        let mut removed = None;
        for column in &mut self.columns {
            while let Some(index) = column.position(key) {
                let task = column.tasks.remove(index);
                removed.get_or_insert(task);
            }
        }
        removed
    }

    /// Swap the task addressed by `key` for `task`.
    ///
    /// The replacement keeps its slot when it stays on the same day;
    /// otherwise it is appended to the column matching its date (or leaves
    /// the week). Returns `false` when `key` is not on the board.
    pub fn replace(&mut self, key: &TaskKey, task: BoardTask) -> bool {
        let Some((ci, ti)) = self.locate(key) else {
            return false;
        };

        if self.columns[ci].date == task.date {
            self.columns[ci].tasks[ti] = task;
        } else {
            self.remove(key);
            self.insert(task, None);
        }
        true
    }

    /// Move a task out of the `from` column to `index` in the `to` column,
    /// rewriting its date. Returns the moved task.
    pub fn move_task(
        &mut self,
        key: &TaskKey,
        from: NaiveDate,
        to: NaiveDate,
        index: usize,
    ) -> Result<BoardTask> {
        let task = self
            .column(from)
            .and_then(|c| c.get(key))
            .cloned()
            .ok_or_else(|| Error::TaskNotFound(key.to_string()))?;
        if self.column(to).is_none() {
            return Err(Error::InvalidInput(format!(
                "{} is not part of the displayed week",
                to
            )));
        }

        self.remove(key);
        let moved = BoardTask { date: to, ..task };
        self.insert(moved.clone(), Some(index));
        Ok(moved)
    }
}
