//! File-based task storage implementation
//!
//! Stores tasks as a JSON array on disk, in insertion order.

use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::model::Task;
use super::repository::TaskRepository;
use crate::calendar::DateRange;
use crate::{Error, Result};

/// File-based task store using JSON
pub struct FileTaskStore {
    /// Path to the JSON file
    path: PathBuf,
    /// In-memory copy of the file, oldest record first
    tasks: RwLock<Vec<Task>>,
}

impl FileTaskStore {
    /// Create a new FileTaskStore
    ///
    /// If the file doesn't exist, it will be created on first write.
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let tasks = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            serde_json::from_str(&content)?
        } else {
            Vec::new()
        };

        debug!("Loaded {} tasks from {}", tasks.len(), path.display());

        Ok(Self {
            path,
            tasks: RwLock::new(tasks),
        })
    }

    /// Write `tasks` to disk.
    ///
    /// Callers hold the write guard so writes never interleave; the content
    /// goes to a sibling temp file first and is renamed over the real one.
    async fn persist(&self, tasks: &[Task]) -> Result<()> {
        let content = serde_json::to_string_pretty(tasks)?;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for FileTaskStore {
    async fn create(&self, task: Task) -> Result<Task> {
        let mut tasks = self.tasks.write().await;
        if tasks.iter().any(|t| t.id == task.id) {
            return Err(Error::Validation(format!(
                "Task with ID {} already exists",
                task.id
            )));
        }
        tasks.push(task.clone());
        if let Err(e) = self.persist(&tasks).await {
            tasks.pop();
            return Err(e);
        }
        Ok(task)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_range(&self, range: &DateRange) -> Result<Vec<Task>> {
        let tasks = self.tasks.read().await;
        let mut matching: Vec<Task> = tasks
            .iter()
            .filter(|t| range.contains(t.date))
            .cloned()
            .collect();
        // Stable sort keeps insertion order within a day
        matching.sort_by_key(|t| t.date);
        Ok(matching)
    }

    async fn update(&self, mut task: Task) -> Result<Task> {
        task.updated_at = Utc::now();
        let mut tasks = self.tasks.write().await;
        let Some(index) = tasks.iter().position(|t| t.id == task.id) else {
            return Err(Error::TaskNotFound(task.id.to_string()));
        };
        task.created_at = tasks[index].created_at;
        let previous = std::mem::replace(&mut tasks[index], task.clone());
        if let Err(e) = self.persist(&tasks).await {
            tasks[index] = previous;
            return Err(e);
        }
        Ok(task)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Task>> {
        let mut tasks = self.tasks.write().await;
        let Some(index) = tasks.iter().position(|t| t.id == id) else {
            return Ok(None);
        };
        let removed = tasks.remove(index);
        if let Err(e) = self.persist(&tasks).await {
            tasks.insert(index, removed);
            return Err(e);
        }
        Ok(Some(removed))
    }
}
