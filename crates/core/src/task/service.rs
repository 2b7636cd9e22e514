//! Task service
//!
//! Composes a [`TaskRepository`] with an optional [`TaskCache`]. The store is
//! the source of truth: every cache failure is logged and treated as a miss.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::model::{NewTask, Task, TaskChanges, TaskRef};
use super::repository::TaskRepository;
use crate::cache::{day_key, task_key, TaskCache};
use crate::calendar::DateRange;
use crate::{Error, Result};

/// Expiry applied to every cache entry unless configured otherwise
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Ranges longer than this bypass the per-day cache
const MAX_CACHED_RANGE_DAYS: i64 = 62;

/// Outcome of an update request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upserted {
    /// An existing record was changed
    Updated(Task),
    /// The target was a temporary id, so a new record was stored
    Created(Task),
}

impl Upserted {
    pub fn task(&self) -> &Task {
        match self {
            Self::Updated(task) | Self::Created(task) => task,
        }
    }

    pub fn into_task(self) -> Task {
        match self {
            Self::Updated(task) | Self::Created(task) => task,
        }
    }
}

struct CacheHandle {
    cache: Arc<dyn TaskCache>,
    ttl: Duration,
}

/// Task operations backing the REST surface
pub struct TaskService {
    repo: Arc<dyn TaskRepository>,
    cache: Option<CacheHandle>,
    /// Bumped by every invalidation; a read that overlaps a write must not
    /// leave its snapshot in the cache
    writes: AtomicU64,
}

impl TaskService {
    /// Create a service without caching
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self {
            repo,
            cache: None,
            writes: AtomicU64::new(0),
        }
    }

    /// Put a cache in front of list and single-task reads
    pub fn with_cache(mut self, cache: Arc<dyn TaskCache>, ttl: Duration) -> Self {
        self.cache = Some(CacheHandle { cache, ttl });
        self
    }

    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    /// Tasks dated within `range`, ascending by date
    pub async fn list(&self, range: &DateRange) -> Result<Vec<Task>> {
        if let Some(tasks) = self.cached_range(range).await {
            debug!("Cache hit for {}..{}", range.start(), range.end());
            return Ok(tasks);
        }

        let epoch = self.writes.load(Ordering::SeqCst);
        let tasks = self.repo.list_range(range).await?;
        debug!(
            "Loaded {} tasks for {}..{} from store",
            tasks.len(),
            range.start(),
            range.end()
        );
        self.populate_days(range, &tasks, epoch).await;
        Ok(tasks)
    }

    /// A single persisted task
    pub async fn get(&self, id: Uuid) -> Result<Task> {
        if let Some(task) = self.cache_get::<Task>(&task_key(id)).await {
            return Ok(task);
        }

        let epoch = self.writes.load(Ordering::SeqCst);
        let task = self
            .repo
            .get(id)
            .await?
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        if self.is_current(epoch) {
            self.cache_set(&task_key(id), &task).await;
            if !self.is_current(epoch) {
                self.cache_delete(&task_key(id)).await;
            }
        }
        Ok(task)
    }

    /// Store a new task
    pub async fn create(&self, new: NewTask) -> Result<Task> {
        let created = self.repo.create(Task::from(new)).await?;
        self.invalidate(created.id, &[created.date]).await;
        debug!("Created task {} on {}", created.id, created.date);
        Ok(created)
    }

    /// Apply `changes` to the addressed task.
    ///
    /// A temporary id never matches a stored record; the changes are stored
    /// as a new task instead.
    pub async fn update(&self, target: &TaskRef, changes: TaskChanges) -> Result<Upserted> {
        let id = match target {
            TaskRef::Persisted(id) => *id,
            TaskRef::Temporary(raw) => {
                debug!("Update addressed to temporary id {}, creating instead", raw);
                let new = changes.into_new_task(Utc::now().date_naive());
                return self.create(new).await.map(Upserted::Created);
            }
        };

        let mut task = self
            .repo
            .get(id)
            .await?
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        let old_date = task.date;
        task.apply(&changes);

        let updated = self.repo.update(task).await?;
        self.invalidate(id, &[old_date, updated.date]).await;
        Ok(Upserted::Updated(updated))
    }

    /// Delete the addressed task; temporary ids succeed without a store call
    pub async fn delete(&self, target: &TaskRef) -> Result<()> {
        let id = match target {
            TaskRef::Persisted(id) => *id,
            TaskRef::Temporary(raw) => {
                debug!("Delete addressed to temporary id {}, nothing stored", raw);
                return Ok(());
            }
        };

        let removed = self
            .repo
            .delete(id)
            .await?
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        self.invalidate(id, &[removed.date]).await;
        Ok(())
    }

    /// Union of the per-day entries, or `None` if any day is missing
    async fn cached_range(&self, range: &DateRange) -> Option<Vec<Task>> {
        if self.cache.is_none() || range.len_days() > MAX_CACHED_RANGE_DAYS {
            return None;
        }

        let mut tasks = Vec::new();
        for day in range.days() {
            let day_tasks: Vec<Task> = self.cache_get(&day_key(day)).await?;
            tasks.extend(day_tasks);
        }
        Some(tasks)
    }

    async fn populate_days(&self, range: &DateRange, tasks: &[Task], epoch: u64) {
        if self.cache.is_none() || range.len_days() > MAX_CACHED_RANGE_DAYS {
            return;
        }
        if !self.is_current(epoch) {
            debug!(
                "Store changed during read, not caching {}..{}",
                range.start(),
                range.end()
            );
            return;
        }

        let mut by_day: BTreeMap<NaiveDate, Vec<&Task>> =
            range.days().map(|day| (day, Vec::new())).collect();
        for task in tasks {
            if let Some(bucket) = by_day.get_mut(&task.date) {
                bucket.push(task);
            }
        }

        for (day, day_tasks) in &by_day {
            self.cache_set(&day_key(*day), day_tasks).await;
        }

        // A write that bumped the counter before our sets landed may have
        // deleted its keys too early
        if !self.is_current(epoch) {
            for day in by_day.keys() {
                self.cache_delete(&day_key(*day)).await;
            }
        }
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.writes.load(Ordering::SeqCst) == epoch
    }

    async fn invalidate(&self, id: Uuid, dates: &[NaiveDate]) {
        // Before the deletes, so overlapping reads see it
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.cache_delete(&task_key(id)).await;
        for date in dates {
            self.cache_delete(&day_key(*date)).await;
        }
    }

    async fn cache_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let handle = self.cache.as_ref()?;
        let raw = match handle.cache.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Cache read failed for {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding unreadable cache entry {}: {}", key, e);
                None
            }
        }
    }

    async fn cache_set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let Some(handle) = &self.cache else {
            return;
        };
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to encode cache entry {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = handle.cache.set(key, raw, handle.ttl).await {
            warn!("Cache write failed for {}: {}", key, e);
        }
    }

    async fn cache_delete(&self, key: &str) {
        let Some(handle) = &self.cache else {
            return;
        };
        if let Err(e) = handle.cache.delete(key).await {
            warn!("Cache invalidation failed for {}: {}", key, e);
        }
    }
}
