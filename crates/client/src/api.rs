//! Task API client
//!
//! Typed wrappers around the task REST endpoints.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use weekplan_core::calendar::DateRange;
use weekplan_core::task::{NewTask, Task, TaskChanges};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Operations the board needs from the server
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Tasks dated within `range`
    async fn fetch_tasks(&self, range: &DateRange) -> Result<Vec<Task>>;

    /// Store a new task
    async fn create_task(&self, task: &NewTask) -> Result<Task>;

    /// Apply a partial update
    async fn update_task(&self, id: Uuid, changes: &TaskChanges) -> Result<Task>;

    /// Delete a task
    async fn delete_task(&self, id: Uuid) -> Result<()>;
}

/// HTTP implementation of [`TaskApi`]
pub struct HttpTaskApi {
    client: Client,
    config: ClientConfig,
}

impl HttpTaskApi {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Decode a JSON body, or turn a failure status into [`ClientError::Api`]
    async fn read_json<T: DeserializeOwned>(
        res: Response,
        action: &str,
        fallback: &str,
    ) -> Result<T> {
        let status = res.status();
        let body = res
            .bytes()
            .await
            .map_err(|e| ClientError::network(action, e))?;

        if !status.is_success() {
            return Err(ClientError::api(status.as_u16(), error_message(&body, fallback)));
        }

        serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Human readable message from an error body.
///
/// Prefers an `errors` array (joined with `", "`), then an `error` string,
/// then `fallback`.
pub fn error_message(body: &[u8], fallback: &str) -> String {
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        return fallback.to_string();
    };

    if let Some(errors) = value.get("errors").and_then(Value::as_array) {
        let parts: Vec<String> = errors
            .iter()
            .map(|e| match e {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        if !parts.is_empty() {
            return parts.join(", ");
        }
    }

    match value.get("error").and_then(Value::as_str) {
        Some(error) if !error.is_empty() => error.to_string(),
        _ => fallback.to_string(),
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn fetch_tasks(&self, range: &DateRange) -> Result<Vec<Task>> {
        debug!("GET {} {}..{}", self.config.tasks_url(), range.start(), range.end());
        let res = self
            .client
            .get(self.config.tasks_url())
            .query(&[
                ("start", range.start().to_string()),
                ("end", range.end().to_string()),
            ])
            .send()
            .await
            .map_err(|e| ClientError::network("fetch tasks", e))?;

        Self::read_json(res, "fetch tasks", "Failed to fetch tasks").await
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task> {
        let res = self
            .client
            .post(self.config.tasks_url())
            .json(task)
            .send()
            .await
            .map_err(|e| ClientError::network("create task", e))?;

        Self::read_json(res, "create task", "Failed to create task").await
    }

    async fn update_task(&self, id: Uuid, changes: &TaskChanges) -> Result<Task> {
        let res = self
            .client
            .put(self.config.task_url(id))
            .json(changes)
            .send()
            .await
            .map_err(|e| ClientError::network("update task", e))?;

        Self::read_json(res, "update task", "Failed to update task").await
    }

    async fn delete_task(&self, id: Uuid) -> Result<()> {
        let res = self
            .client
            .delete(self.config.task_url(id))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ClientError::network("delete task", e))?;

        // Any 2xx counts, whatever the body holds
        let status = res.status();
        if status.is_success() {
            return Ok(());
        }

        let body = match res.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to read delete error body: {}", e);
                Default::default()
            }
        };
        Err(ClientError::api(
            status.as_u16(),
            error_message(&body, "Failed to delete task"),
        ))
    }
}
