//! Task repository trait
//!
//! Defines the interface for task storage operations.

use async_trait::async_trait;
use uuid::Uuid;

use super::model::Task;
use crate::calendar::DateRange;
use crate::Result;

/// Repository interface for task CRUD operations
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Persist a new task
    async fn create(&self, task: Task) -> Result<Task>;

    /// Get a task by ID
    async fn get(&self, id: Uuid) -> Result<Option<Task>>;

    /// Tasks dated within `range`, ascending by date then insertion order
    async fn list_range(&self, range: &DateRange) -> Result<Vec<Task>>;

    /// Replace an existing task, refreshing `updated_at`
    async fn update(&self, task: Task) -> Result<Task>;

    /// Delete a task by ID, returning the removed record
    async fn delete(&self, id: Uuid) -> Result<Option<Task>>;
}
