//! Optimistic mutations
//!
//! Each call applies its effect locally through `apply` before the request
//! is sent, then either returns the server's answer or runs `rollback` and
//! hands back the error. `rollback` runs exactly when the request fails.
//! Mutations addressed to a pending task never reach the network.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use weekplan_core::task::{NewTask, Task, TaskChanges};
use weekplan_core::week::{BoardTask, LocalId, TaskKey};

use crate::api::TaskApi;
use crate::error::Result;

/// A confirmed optimistic create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    /// Placeholder the local copy was filed under
    pub local_id: LocalId,
    /// The stored record
    pub task: Task,
}

/// Wraps a [`TaskApi`] with local-first semantics
pub struct OptimisticApi<A> {
    api: Arc<A>,
    next_local_id: AtomicU64,
}

impl<A: TaskApi> OptimisticApi<A> {
    pub fn new(api: Arc<A>) -> Self {
        // Seeded from the clock so placeholders read like `temp_<millis>`
        let seed = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        Self {
            api,
            next_local_id: AtomicU64::new(seed),
        }
    }

    /// The wrapped API, for calls that need no local effect
    pub fn inner(&self) -> &A {
        &self.api
    }

    fn allocate_local_id(&self) -> LocalId {
        LocalId(self.next_local_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Show `draft` under a fresh pending key, then create it on the server
    pub async fn create_task<F, R>(&self, draft: NewTask, apply: F, rollback: R) -> Result<Created>
    where
        F: FnOnce(BoardTask),
        R: FnOnce(),
    {
        let local_id = self.allocate_local_id();
        let optimistic = BoardTask::pending(local_id, draft.content.clone(), draft.date)
            .with_completed(draft.completed);
        apply(optimistic);

        match self.api.create_task(&draft).await {
            Ok(task) => {
                debug!("Task {} confirmed as {}", local_id, task.id);
                Ok(Created { local_id, task })
            }
            Err(e) => {
                warn!("Create of {} failed: {}", local_id, e);
                rollback();
                Err(e)
            }
        }
    }

    /// Show `current` merged with `changes`, then send the update.
    ///
    /// Returns `None` when `current` is still pending: the change stays
    /// local until the create is confirmed.
    pub async fn update_task<F, R>(
        &self,
        current: &BoardTask,
        changes: TaskChanges,
        apply: F,
        rollback: R,
    ) -> Result<Option<Task>>
    where
        F: FnOnce(BoardTask),
        R: FnOnce(),
    {
        apply(current.with_changes(&changes));

        let TaskKey::Persisted { id } = current.key else {
            debug!("Update of pending task {} kept local", current.key);
            return Ok(None);
        };

        match self.api.update_task(id, &changes).await {
            Ok(task) => Ok(Some(task)),
            Err(e) => {
                warn!("Update of {} failed: {}", id, e);
                rollback();
                Err(e)
            }
        }
    }

    /// Remove the task locally, then delete it on the server
    pub async fn delete_task<F, R>(&self, key: TaskKey, apply: F, rollback: R) -> Result<()>
    where
        F: FnOnce(),
        R: FnOnce(),
    {
        apply();

        let TaskKey::Persisted { id } = key else {
            debug!("Delete of pending task {} kept local", key);
            return Ok(());
        };

        match self.api.delete_task(id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Delete of {} failed: {}", id, e);
                rollback();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ClientError;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use uuid::Uuid;
    use weekplan_core::calendar::DateRange;

    /// Requests seen by [`FakeApi`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Fetch(DateRange),
        Create(NewTask),
        Update(Uuid, TaskChanges),
        Delete(Uuid),
    }

    /// In-memory server: records calls and can be told to fail the next ones
    #[derive(Default)]
    pub struct FakeApi {
        pub tasks: Mutex<Vec<Task>>,
        pub calls: Mutex<Vec<Call>>,
        pub failures: Mutex<VecDeque<ClientError>>,
        /// When set, the next create waits for the sender to fire
        pub create_gate: tokio::sync::Mutex<Option<tokio::sync::oneshot::Receiver<()>>>,
    }

    impl FakeApi {
        pub fn with_tasks(tasks: Vec<Task>) -> Self {
            Self {
                tasks: Mutex::new(tasks),
                ..Self::default()
            }
        }

        pub fn fail_next(&self, status: u16, message: &str) {
            self.failures
                .lock()
                .push_back(ClientError::api(status, message));
        }

        /// Keep the next create in flight until the returned sender fires
        pub async fn hold_next_create(&self) -> tokio::sync::oneshot::Sender<()> {
            let (release, gate) = tokio::sync::oneshot::channel();
            *self.create_gate.lock().await = Some(gate);
            release
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().clone()
        }

        fn record(&self, call: Call) -> Result<()> {
            self.calls.lock().push(call);
            match self.failures.lock().pop_front() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl TaskApi for FakeApi {
        async fn fetch_tasks(&self, range: &DateRange) -> Result<Vec<Task>> {
            self.record(Call::Fetch(*range))?;
            let mut tasks: Vec<Task> = self
                .tasks
                .lock()
                .iter()
                .filter(|t| range.contains(t.date))
                .cloned()
                .collect();
            tasks.sort_by_key(|t| t.date);
            Ok(tasks)
        }

        async fn create_task(&self, task: &NewTask) -> Result<Task> {
            let gate = self.create_gate.lock().await.take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.record(Call::Create(task.clone()))?;
            let created = Task::from(task.clone());
            self.tasks.lock().push(created.clone());
            Ok(created)
        }

        async fn update_task(&self, id: Uuid, changes: &TaskChanges) -> Result<Task> {
            self.record(Call::Update(id, changes.clone()))?;
            let mut tasks = self.tasks.lock();
            let task = tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| ClientError::api(404, "Task not found"))?;
            task.apply(changes);
            task.updated_at = Utc::now();
            Ok(task.clone())
        }

        async fn delete_task(&self, id: Uuid) -> Result<()> {
            self.record(Call::Delete(id))?;
            let mut tasks = self.tasks.lock();
            let before = tasks.len();
            tasks.retain(|t| t.id != id);
            if tasks.len() == before {
                return Err(ClientError::api(404, "Task not found"));
            }
            Ok(())
        }
    }

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[tokio::test]
    async fn test_create_applies_before_request_and_confirms() {
        let api = Arc::new(FakeApi::default());
        let optimistic = OptimisticApi::new(Arc::clone(&api));
        let applied = Mutex::new(None);
        let rolled_back = Mutex::new(false);

        let created = optimistic
            .create_task(
                NewTask::new("write spec", june(10)),
                |task| {
                    // Nothing has been sent yet
                    assert!(api.calls().is_empty());
                    *applied.lock() = Some(task);
                },
                || *rolled_back.lock() = true,
            )
            .await
            .unwrap();

        let applied = applied.lock().clone().unwrap();
        assert_eq!(applied.key, TaskKey::pending(created.local_id));
        assert_eq!(applied.content, "write spec");
        assert_eq!(created.task.content, "write spec");
        assert!(!*rolled_back.lock());
    }

    #[tokio::test]
    async fn test_create_failure_rolls_back_and_propagates() {
        let api = Arc::new(FakeApi::default());
        api.fail_next(500, "Failed to create task");
        let optimistic = OptimisticApi::new(Arc::clone(&api));
        let rolled_back = Mutex::new(false);

        let err = optimistic
            .create_task(
                NewTask::new("", june(10)),
                |_| {},
                || *rolled_back.lock() = true,
            )
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert!(*rolled_back.lock());
    }

    #[tokio::test]
    async fn test_local_ids_are_unique() {
        let optimistic = OptimisticApi::new(Arc::new(FakeApi::default()));
        let a = optimistic.allocate_local_id();
        let b = optimistic.allocate_local_id();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("temp_"));
    }

    #[tokio::test]
    async fn test_update_applies_merged_record() {
        let stored = Task::new("draft", june(10));
        let api = Arc::new(FakeApi::with_tasks(vec![stored.clone()]));
        let optimistic = OptimisticApi::new(Arc::clone(&api));
        let current = BoardTask::from(stored.clone());
        let applied = Mutex::new(None);

        let confirmed = optimistic
            .update_task(
                &current,
                TaskChanges::completed(true),
                |task| *applied.lock() = Some(task),
                || panic!("rollback must not run on success"),
            )
            .await
            .unwrap()
            .unwrap();

        let applied = applied.lock().clone().unwrap();
        assert_eq!(applied.content, "draft");
        assert!(applied.completed);
        assert!(confirmed.completed);
        assert_eq!(
            api.calls(),
            vec![Call::Update(stored.id, TaskChanges::completed(true))]
        );
    }

    #[tokio::test]
    async fn test_update_failure_rolls_back() {
        let stored = Task::new("draft", june(10));
        let api = Arc::new(FakeApi::with_tasks(vec![stored.clone()]));
        api.fail_next(400, "Invalid date");
        let optimistic = OptimisticApi::new(Arc::clone(&api));
        let rolled_back = Mutex::new(false);

        let result = optimistic
            .update_task(
                &BoardTask::from(stored),
                TaskChanges::content("edited"),
                |_| {},
                || *rolled_back.lock() = true,
            )
            .await;

        assert!(result.is_err());
        assert!(*rolled_back.lock());
    }

    #[tokio::test]
    async fn test_pending_mutations_skip_the_network() {
        let api = Arc::new(FakeApi::default());
        let optimistic = OptimisticApi::new(Arc::clone(&api));
        let pending = BoardTask::pending(LocalId(1718000000000), "", june(10));

        let outcome = optimistic
            .update_task(&pending, TaskChanges::content("typed"), |_| {}, || {
                panic!("rollback must not run")
            })
            .await
            .unwrap();
        assert!(outcome.is_none());

        let removed = Mutex::new(false);
        optimistic
            .delete_task(pending.key, || *removed.lock() = true, || {
                panic!("rollback must not run")
            })
            .await
            .unwrap();

        assert!(*removed.lock());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_rolls_back() {
        let api = Arc::new(FakeApi::default());
        let optimistic = OptimisticApi::new(Arc::clone(&api));
        let rolled_back = Mutex::new(false);

        // Unknown id: the fake answers 404
        let err = optimistic
            .delete_task(
                TaskKey::persisted(Uuid::new_v4()),
                || {},
                || *rolled_back.lock() = true,
            )
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(*rolled_back.lock());
    }
}
