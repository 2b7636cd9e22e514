//! Application state

use std::sync::Arc;

use weekplan_core::cache::{MemoryCache, TaskCache};
use weekplan_core::task::{FileTaskStore, TaskService};

use crate::config::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    tasks: TaskService,
    cache: Option<Arc<MemoryCache>>,
}

impl AppState {
    /// Open the task store under the configured data directory and attach
    /// the cache when enabled
    pub async fn new(config: &ServerConfig) -> weekplan_core::Result<Self> {
        let store = FileTaskStore::new(config.tasks_path()).await?;
        let mut tasks = TaskService::new(Arc::new(store));

        let cache = config.cache_enabled.then(|| Arc::new(MemoryCache::new()));
        if let Some(cache) = &cache {
            let shared: Arc<dyn TaskCache> = cache.clone();
            tasks = tasks.with_cache(shared, config.cache_ttl);
        }

        Ok(Self {
            inner: Arc::new(AppStateInner { tasks, cache }),
        })
    }

    pub fn tasks(&self) -> &TaskService {
        &self.inner.tasks
    }

    /// The in-process cache, when caching is enabled
    pub fn cache(&self) -> Option<Arc<MemoryCache>> {
        self.inner.cache.clone()
    }
}
