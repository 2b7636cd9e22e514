//! Client configuration

/// Where the task API lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Read `WEEKPLAN_API_URL`, falling back to the local default
    pub fn from_env() -> Self {
        std::env::var("WEEKPLAN_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map(Self::new)
            .unwrap_or_default()
    }

    pub(crate) fn tasks_url(&self) -> String {
        format!("{}/api/tasks", self.base_url)
    }

    pub(crate) fn task_url(&self, id: impl std::fmt::Display) -> String {
        format!("{}/api/tasks/{}", self.base_url, id)
    }
}
