//! Week board controller
//!
//! Owns the displayed [`WeekData`] and runs every user action against it:
//! the local transition happens first, the server call second, and the
//! response is reconciled only if no newer request for the same entity was
//! issued in the meantime.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use weekplan_core::calendar::week_label;
use weekplan_core::task::{NewTask, Task, TaskChanges};
use weekplan_core::week::{BoardTask, LocalId, TaskKey, WeekData};

use crate::api::TaskApi;
use crate::error::{ClientError, Result};
use crate::notify::Notifier;
use crate::optimistic::{Created, OptimisticApi};
use crate::sequence::{RequestSequencer, Ticket};

/// What a request is about, for sequencing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Entity {
    Week,
    Task(TaskKey),
}

/// The board for one visible week
pub struct WeekBoard<A> {
    api: OptimisticApi<A>,
    anchor: Mutex<NaiveDate>,
    week: Mutex<WeekData>,
    sequencer: RequestSequencer<Entity>,
    notifier: Notifier,
    last_error: Mutex<Option<String>>,
    /// Pending tasks deleted before their create was confirmed
    discarded: Mutex<HashSet<LocalId>>,
}

impl<A: TaskApi> WeekBoard<A> {
    /// A board showing the week containing `anchor`; call [`load`](Self::load)
    /// to fill it
    pub fn new(api: Arc<A>, anchor: NaiveDate) -> Self {
        Self::with_notifier(api, anchor, Notifier::default())
    }

    pub fn with_notifier(api: Arc<A>, anchor: NaiveDate, notifier: Notifier) -> Self {
        Self {
            api: OptimisticApi::new(api),
            anchor: Mutex::new(anchor),
            week: Mutex::new(WeekData::empty(anchor)),
            sequencer: RequestSequencer::new(),
            notifier,
            last_error: Mutex::new(None),
            discarded: Mutex::new(HashSet::new()),
        }
    }

    /// Copy of the current week state
    pub fn snapshot(&self) -> WeekData {
        self.week.lock().clone()
    }

    pub fn anchor(&self) -> NaiveDate {
        *self.anchor.lock()
    }

    /// Year and ISO week number of the visible week
    pub fn label(&self) -> String {
        week_label(self.anchor())
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Message of the last failed operation, cleared by a successful load
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    pub fn task(&self, key: &TaskKey) -> Option<BoardTask> {
        self.week.lock().get(key).cloned()
    }

    // ------------------------------------------------------------------
    // Loading and navigation
    // ------------------------------------------------------------------

    /// Fetch the visible week and replace the local state with it
    pub async fn load(&self) -> Result<()> {
        let anchor = self.anchor();
        let range = WeekData::empty(anchor).range();
        let ticket = self.sequencer.issue(Entity::Week);

        let result = match self.api.inner().fetch_tasks(&range).await {
            Ok(tasks) if self.sequencer.is_current(&ticket) => {
                let count = tasks.len();
                *self.week.lock() = WeekData::from_tasks(anchor, tasks);
                *self.last_error.lock() = None;
                info!("Loaded {} tasks for week of {}", count, range.start());
                Ok(())
            }
            Ok(_) => {
                debug!("Dropping stale week fetch for {}", range.start());
                Ok(())
            }
            Err(e) => {
                error!("Failed to fetch week of {}: {}", range.start(), e);
                if self.sequencer.is_current(&ticket) {
                    self.record_error(&e);
                }
                Err(e)
            }
        };
        self.sequencer.settle(&ticket);
        result
    }

    /// Show the week containing `anchor`
    pub async fn go_to(&self, anchor: NaiveDate) -> Result<()> {
        *self.anchor.lock() = anchor;
        *self.week.lock() = WeekData::empty(anchor);
        self.load().await
    }

    pub async fn next_week(&self) -> Result<()> {
        self.go_to(self.anchor() + Duration::weeks(1)).await
    }

    pub async fn previous_week(&self) -> Result<()> {
        self.go_to(self.anchor() - Duration::weeks(1)).await
    }

    pub async fn today(&self) -> Result<()> {
        self.go_to(Utc::now().date_naive()).await
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Add an empty task at the end of `date`'s column
    pub async fn create_task(&self, date: NaiveDate) -> Result<BoardTask> {
        if self.week.lock().column(date).is_none() {
            return Err(ClientError::InvalidInput(format!(
                "{} is not part of the displayed week",
                date
            )));
        }

        let pending_key = Mutex::new(None);
        let outcome = self
            .api
            .create_task(
                NewTask::new("", date),
                |task| {
                    *pending_key.lock() = Some(task.key);
                    self.week.lock().insert(task, None);
                },
                || {
                    if let Some(key) = *pending_key.lock() {
                        self.week.lock().remove(&key);
                    }
                },
            )
            .await;

        match outcome {
            Ok(created) => {
                let task = self.confirm_created(created).await;
                self.notifier.success("Task created");
                Ok(task)
            }
            Err(e) => {
                if let Some(TaskKey::Pending { local_id }) = *pending_key.lock() {
                    self.discarded.lock().remove(&local_id);
                }
                Err(self.fail("Failed to create task", e))
            }
        }
    }

    /// Swap the pending copy for the stored record and replay anything the
    /// user did to it while the create was in flight
    async fn confirm_created(&self, created: Created) -> BoardTask {
        let Created { local_id, task } = created;
        let pending = TaskKey::pending(local_id);
        let confirmed = BoardTask::from(task.clone());

        if self.discarded.lock().remove(&local_id) {
            debug!("Task {} was deleted while pending, removing {}", local_id, task.id);
            if let Err(e) = self.api.inner().delete_task(task.id).await {
                warn!("Failed to remove discarded task {}: {}", task.id, e);
            }
            return confirmed;
        }

        let merged = {
            let mut week = self.week.lock();
            let merged = week.get(&pending).map(|local| {
                let changes = local.diff(&task);
                let shown = if changes.is_empty() {
                    confirmed.clone()
                } else {
                    confirmed.with_changes(&changes)
                };
                (shown, changes)
            });
            if let Some((shown, _)) = &merged {
                week.replace(&pending, shown.clone());
            }
            merged
        };

        match merged {
            Some((shown, changes)) if !changes.is_empty() => {
                self.replay_pending_edits(shown, changes).await
            }
            _ => confirmed,
        }
    }

    /// Send edits made to a task while its create was in flight
    async fn replay_pending_edits(&self, shown: BoardTask, changes: TaskChanges) -> BoardTask {
        let key = shown.key;
        let Some(id) = key.id() else {
            return shown;
        };
        let ticket = self.sequencer.issue(Entity::Task(key));

        let synced = match self.api.inner().update_task(id, &changes).await {
            Ok(task) => self.reconcile(&ticket, task),
            Err(e) => {
                warn!("Failed to sync edits made while {} was pending: {}", id, e);
                self.record_error(&e);
                shown
            }
        };
        self.sequencer.settle(&ticket);
        synced
    }

    /// Apply a partial update to a task on the board
    pub async fn update_task(&self, key: TaskKey, changes: TaskChanges) -> Result<BoardTask> {
        let current = self.require(&key)?;
        let position = self.week.lock().locate(&key).map(|(_, index)| index);
        let ticket = self.sequencer.issue(Entity::Task(key));

        let outcome = self
            .api
            .update_task(
                &current,
                changes,
                |optimistic| {
                    self.week.lock().replace(&key, optimistic);
                },
                || {
                    if self.sequencer.is_current(&ticket) {
                        // Back into the original slot, even if the date changed
                        let mut week = self.week.lock();
                        week.remove(&key);
                        week.insert(current.clone(), position);
                    }
                },
            )
            .await;

        let result = match outcome {
            Ok(Some(task)) => {
                let applied = self.reconcile(&ticket, task);
                self.notifier.success("Task updated");
                Ok(applied)
            }
            Ok(None) => {
                self.notifier.success("Task updated");
                self.require(&key)
            }
            Err(e) => Err(self.fail("Failed to update task", e)),
        };
        self.sequencer.settle(&ticket);
        result
    }

    /// Replace a task's content; unchanged content is not sent
    pub async fn edit_content(&self, key: TaskKey, content: &str) -> Result<BoardTask> {
        let current = self.require(&key)?;
        if current.content == content {
            return Ok(current);
        }
        self.update_task(key, TaskChanges::content(content)).await
    }

    /// Flip the completion flag
    pub async fn toggle_completed(&self, key: TaskKey) -> Result<BoardTask> {
        let current = self.require(&key)?;
        self.update_task(key, TaskChanges::completed(!current.completed))
            .await
    }

    /// Remove a task from the board and the store
    pub async fn delete_task(&self, key: TaskKey) -> Result<()> {
        let current = self.require(&key)?;
        let position = self.week.lock().locate(&key).map(|(_, index)| index);
        let ticket = self.sequencer.issue(Entity::Task(key));

        let outcome = self
            .api
            .delete_task(
                key,
                || {
                    self.week.lock().remove(&key);
                },
                || {
                    if self.sequencer.is_current(&ticket) {
                        self.week.lock().insert(current.clone(), position);
                    }
                },
            )
            .await;

        let result = match outcome {
            Ok(()) => {
                if let TaskKey::Pending { local_id } = key {
                    self.discarded.lock().insert(local_id);
                }
                self.notifier.success("Task deleted");
                Ok(())
            }
            Err(e) => Err(self.fail("Failed to delete task", e)),
        };
        self.sequencer.settle(&ticket);
        result
    }

    /// Drag-and-drop: move a task from the `from` column to `index` in the
    /// `to` column.
    ///
    /// A failed server update re-fetches the whole week.
    pub async fn move_task(
        &self,
        key: TaskKey,
        from: NaiveDate,
        to: NaiveDate,
        index: usize,
    ) -> Result<()> {
        let current = {
            let week = self.week.lock();
            let Some(column) = week.column(from) else {
                return Err(self.fail_local(ClientError::TaskNotFound(key.to_string())));
            };
            if from == to && column.position(&key) == Some(index) {
                return Ok(());
            }
            column.get(&key).cloned()
        };
        let Some(current) = current else {
            warn!("Task {} not found in column {}", key, from);
            return Err(self.fail_local(ClientError::TaskNotFound(key.to_string())));
        };
        if self.week.lock().column(to).is_none() {
            return Err(self.fail_local(ClientError::InvalidInput(format!(
                "{} is not part of the displayed week",
                to
            ))));
        }

        let ticket = self.sequencer.issue(Entity::Task(key));
        let changes = TaskChanges {
            content: Some(current.content.clone()),
            completed: Some(current.completed),
            date: Some(to),
        };

        let outcome = self
            .api
            .update_task(
                &current,
                changes,
                |_| {
                    if let Err(e) = self.week.lock().move_task(&key, from, to, index) {
                        warn!("Local move of {} failed: {}", key, e);
                    }
                },
                || {},
            )
            .await;

        if let Ok(Some(task)) = &outcome {
            self.reconcile(&ticket, task.clone());
        }
        self.sequencer.settle(&ticket);

        match outcome {
            Ok(_) => {
                self.notifier.success("Task moved");
                Ok(())
            }
            Err(e) => {
                let err = self.fail("Failed to move task", e);
                if let Err(resync) = self.load().await {
                    warn!("Resync after failed move also failed: {}", resync);
                }
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn require(&self, key: &TaskKey) -> Result<BoardTask> {
        self.task(key)
            .ok_or_else(|| self.fail_local(ClientError::TaskNotFound(key.to_string())))
    }

    /// Apply a server record if `ticket` is still the newest request for it
    fn reconcile(&self, ticket: &Ticket<Entity>, task: Task) -> BoardTask {
        let confirmed = BoardTask::from(task);
        if self.sequencer.is_current(ticket) {
            self.week.lock().replace(&confirmed.key, confirmed.clone());
        } else {
            debug!("Dropping stale response for {}", confirmed.key);
        }
        confirmed
    }

    fn record_error(&self, err: &ClientError) {
        *self.last_error.lock() = Some(err.to_string());
    }

    fn fail(&self, context: &str, err: ClientError) -> ClientError {
        error!("{}: {}", context, err);
        self.record_error(&err);
        self.notifier.error(err.to_string());
        err
    }

    fn fail_local(&self, err: ClientError) -> ClientError {
        warn!("{}", err);
        self.notifier.error(err.to_string());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationKind;
    use crate::optimistic::tests::{Call, FakeApi};
    use uuid::Uuid;
    use weekplan_core::calendar::DateRange;

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    async fn loaded_board(tasks: Vec<Task>) -> (WeekBoard<FakeApi>, Arc<FakeApi>) {
        let api = Arc::new(FakeApi::with_tasks(tasks));
        let board = WeekBoard::new(Arc::clone(&api), june(12));
        board.load().await.unwrap();
        (board, api)
    }

    fn column_keys(board: &WeekBoard<FakeApi>, date: NaiveDate) -> Vec<TaskKey> {
        board
            .snapshot()
            .column(date)
            .unwrap()
            .tasks
            .iter()
            .map(|t| t.key)
            .collect()
    }

    fn last_kind(board: &WeekBoard<FakeApi>) -> NotificationKind {
        board.notifier().current().unwrap().kind
    }

    #[tokio::test]
    async fn test_load_builds_seven_columns() {
        let monday = Task::new("mon", june(10));
        let sunday = Task::new("sun", june(16));
        let (board, api) = loaded_board(vec![monday.clone(), sunday.clone()]).await;

        let week = board.snapshot();
        assert_eq!(week.columns.len(), 7);
        assert_eq!(week.start(), june(10));
        assert_eq!(column_keys(&board, june(10)), vec![TaskKey::persisted(monday.id)]);
        assert_eq!(column_keys(&board, june(16)), vec![TaskKey::persisted(sunday.id)]);
        assert_eq!(
            api.calls(),
            vec![Call::Fetch(DateRange::new(june(10), june(16)).unwrap())]
        );
        assert_eq!(board.label(), "2024 W24");
    }

    #[tokio::test]
    async fn test_failed_load_records_error() {
        let api = Arc::new(FakeApi::default());
        api.fail_next(500, "Failed to fetch tasks");
        let board = WeekBoard::new(Arc::clone(&api), june(12));

        assert!(board.load().await.is_err());
        assert_eq!(board.last_error().as_deref(), Some("Failed to fetch tasks"));

        board.load().await.unwrap();
        assert!(board.last_error().is_none());
    }

    #[tokio::test]
    async fn test_navigation_fetches_neighbouring_weeks() {
        let (board, api) = loaded_board(vec![Task::new("next", june(18))]).await;

        board.next_week().await.unwrap();
        assert_eq!(board.snapshot().start(), june(17));
        assert_eq!(board.snapshot().task_count(), 1);

        board.previous_week().await.unwrap();
        board.previous_week().await.unwrap();
        assert_eq!(board.snapshot().start(), june(3));
        assert_eq!(api.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_create_shows_task_then_swaps_in_server_record() {
        let (board, api) = loaded_board(vec![]).await;

        let created = board.create_task(june(11)).await.unwrap();

        assert!(!created.is_pending());
        assert!(created.needs_edit());
        assert_eq!(column_keys(&board, june(11)), vec![created.key]);
        assert_eq!(api.tasks.lock().len(), 1);
        assert_eq!(last_kind(&board), NotificationKind::Success);
    }

    #[tokio::test]
    async fn test_failed_create_restores_previous_shape() {
        let existing = Task::new("existing", june(11));
        let (board, api) = loaded_board(vec![existing.clone()]).await;
        let before = board.snapshot();
        api.fail_next(500, "Failed to create task");

        let err = board.create_task(june(11)).await.unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert_eq!(board.snapshot(), before);
        assert_eq!(last_kind(&board), NotificationKind::Error);
    }

    #[tokio::test]
    async fn test_create_outside_week_is_rejected() {
        let (board, api) = loaded_board(vec![]).await;
        assert!(board.create_task(june(30)).await.is_err());
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_update_reconciles_with_server_record() {
        let stored = Task::new("draft", june(12));
        let (board, _api) = loaded_board(vec![stored.clone()]).await;
        let key = TaskKey::persisted(stored.id);

        let updated = board.edit_content(key, "final").await.unwrap();
        assert_eq!(updated.content, "final");
        assert_eq!(board.task(&key).unwrap().content, "final");

        let toggled = board.toggle_completed(key).await.unwrap();
        assert!(toggled.completed);
    }

    #[tokio::test]
    async fn test_unchanged_content_is_not_sent() {
        let stored = Task::new("same", june(12));
        let (board, api) = loaded_board(vec![stored.clone()]).await;

        board
            .edit_content(TaskKey::persisted(stored.id), "same")
            .await
            .unwrap();
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_update_rolls_back() {
        let stored = Task::new("draft", june(12));
        let (board, api) = loaded_board(vec![stored.clone()]).await;
        let key = TaskKey::persisted(stored.id);
        api.fail_next(400, "Invalid date");

        let err = board.edit_content(key, "edited").await.unwrap_err();

        assert_eq!(err.to_string(), "Invalid date");
        assert_eq!(board.task(&key).unwrap().content, "draft");
        assert_eq!(board.last_error().as_deref(), Some("Invalid date"));
    }

    #[tokio::test]
    async fn test_delete_and_failed_delete() {
        let first = Task::new("first", june(13));
        let second = Task::new("second", june(13));
        let (board, api) = loaded_board(vec![first.clone(), second.clone()]).await;

        api.fail_next(500, "Failed to delete task");
        assert!(board.delete_task(TaskKey::persisted(first.id)).await.is_err());
        // Restored at its original position
        assert_eq!(
            column_keys(&board, june(13)),
            vec![TaskKey::persisted(first.id), TaskKey::persisted(second.id)]
        );

        board.delete_task(TaskKey::persisted(first.id)).await.unwrap();
        assert_eq!(column_keys(&board, june(13)), vec![TaskKey::persisted(second.id)]);
        assert_eq!(api.tasks.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_task_is_local_not_found() {
        let (board, api) = loaded_board(vec![]).await;
        let key = TaskKey::persisted(Uuid::new_v4());

        let err = board.delete_task(key).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_move_monday_to_wednesday() {
        let dragged = Task::new("dragged", june(10));
        let there = Task::new("there", june(12));
        let (board, api) = loaded_board(vec![dragged.clone(), there.clone()]).await;
        let key = TaskKey::persisted(dragged.id);

        board.move_task(key, june(10), june(12), 0).await.unwrap();

        assert!(column_keys(&board, june(10)).is_empty());
        assert_eq!(
            column_keys(&board, june(12)),
            vec![key, TaskKey::persisted(there.id)]
        );
        assert_eq!(board.task(&key).unwrap().date, june(12));
        assert_eq!(
            api.calls().last(),
            Some(&Call::Update(
                dragged.id,
                TaskChanges {
                    content: Some("dragged".to_string()),
                    completed: Some(false),
                    date: Some(june(12)),
                }
            ))
        );
        assert_eq!(last_kind(&board), NotificationKind::Success);
    }

    #[tokio::test]
    async fn test_failed_move_resyncs_whole_week() {
        let dragged = Task::new("dragged", june(10));
        let (board, api) = loaded_board(vec![dragged.clone()]).await;
        let key = TaskKey::persisted(dragged.id);
        api.fail_next(500, "Failed to update task");

        assert!(board.move_task(key, june(10), june(12), 0).await.is_err());

        // Back where the server has it, via a fresh fetch
        assert_eq!(column_keys(&board, june(10)), vec![key]);
        assert!(column_keys(&board, june(12)).is_empty());
        assert!(matches!(api.calls().last(), Some(Call::Fetch(_))));
    }

    #[tokio::test]
    async fn test_move_from_wrong_column_makes_no_call() {
        let task = Task::new("tue", june(11));
        let (board, api) = loaded_board(vec![task.clone()]).await;

        let err = board
            .move_task(TaskKey::persisted(task.id), june(10), june(12), 0)
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(api.calls().len(), 1);
        assert_eq!(last_kind(&board), NotificationKind::Error);
    }

    #[tokio::test]
    async fn test_drop_on_same_slot_is_noop() {
        let task = Task::new("stay", june(11));
        let (board, api) = loaded_board(vec![task.clone()]).await;

        board
            .move_task(TaskKey::persisted(task.id), june(11), june(11), 0)
            .await
            .unwrap();
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_response_is_dropped() {
        let stored = Task::new("v0", june(12));
        let (board, _api) = loaded_board(vec![stored.clone()]).await;
        let key = TaskKey::persisted(stored.id);

        // A newer request for the same task supersedes this one
        let stale = board.sequencer.issue(Entity::Task(key));
        board.sequencer.issue(Entity::Task(key));

        let mut old = stored.clone();
        old.content = "stale".to_string();
        board.reconcile(&stale, old);

        assert_eq!(board.task(&key).unwrap().content, "v0");
    }

    #[tokio::test]
    async fn test_pending_edits_are_replayed_after_confirmation() {
        let (board, api) = loaded_board(vec![]).await;

        let pending = BoardTask::pending(LocalId(1), "", june(14));
        let server = Task::new("", june(14));
        board.week.lock().insert(
            BoardTask {
                content: "typed while pending".to_string(),
                ..pending.clone()
            },
            None,
        );
        api.tasks.lock().push(server.clone());

        let confirmed = board
            .confirm_created(Created {
                local_id: LocalId(1),
                task: server.clone(),
            })
            .await;

        assert_eq!(confirmed.content, "typed while pending");
        assert_eq!(
            column_keys(&board, june(14)),
            vec![TaskKey::persisted(server.id)]
        );
        assert_eq!(
            api.calls().last(),
            Some(&Call::Update(server.id, TaskChanges::content("typed while pending")))
        );
    }

    #[tokio::test]
    async fn test_pending_delete_removes_confirmed_record() {
        let (board, api) = loaded_board(vec![]).await;
        let pending = BoardTask::pending(LocalId(2), "", june(14));
        board.week.lock().insert(pending.clone(), None);

        board.delete_task(pending.key).await.unwrap();
        assert!(board.snapshot().column(june(14)).unwrap().is_empty());

        let server = Task::new("", june(14));
        api.tasks.lock().push(server.clone());
        board
            .confirm_created(Created {
                local_id: LocalId(2),
                task: server.clone(),
            })
            .await;

        assert_eq!(api.calls().last(), Some(&Call::Delete(server.id)));
        assert!(api.tasks.lock().is_empty());
        assert!(board.snapshot().column(june(14)).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_mutations_on_different_tasks() {
        let a = Task::new("a", june(10));
        let b = Task::new("b", june(11));
        let (board, _api) = loaded_board(vec![a.clone(), b.clone()]).await;

        let (ra, rb) = futures::join!(
            board.toggle_completed(TaskKey::persisted(a.id)),
            board.delete_task(TaskKey::persisted(b.id)),
        );
        ra.unwrap();
        rb.unwrap();

        let week = board.snapshot();
        assert_eq!(week.task_count(), 1);
        assert!(week.get(&TaskKey::persisted(a.id)).unwrap().completed);
    }

    #[tokio::test]
    async fn test_failed_date_change_restores_original_slot() {
        let first = Task::new("first", june(10));
        let second = Task::new("second", june(10));
        let (board, api) = loaded_board(vec![first.clone(), second.clone()]).await;
        api.fail_next(500, "Failed to update task");

        let result = board
            .update_task(TaskKey::persisted(first.id), TaskChanges::date(june(12)))
            .await;

        assert!(result.is_err());
        assert_eq!(
            column_keys(&board, june(10)),
            vec![TaskKey::persisted(first.id), TaskKey::persisted(second.id)]
        );
        assert!(column_keys(&board, june(12)).is_empty());
    }

    #[tokio::test]
    async fn test_settled_requests_are_forgotten() {
        let a = Task::new("a", june(10));
        let b = Task::new("b", june(11));
        let (board, api) = loaded_board(vec![a.clone(), b.clone()]).await;

        board.toggle_completed(TaskKey::persisted(a.id)).await.unwrap();
        board
            .move_task(TaskKey::persisted(a.id), june(10), june(12), 0)
            .await
            .unwrap();
        api.fail_next(500, "Failed to delete task");
        assert!(board.delete_task(TaskKey::persisted(b.id)).await.is_err());
        board.next_week().await.unwrap();

        assert!(board.sequencer.is_empty());
    }

    #[tokio::test]
    async fn test_failed_create_forgets_pending_delete() {
        let (board, api) = loaded_board(vec![]).await;
        let release = api.hold_next_create().await;
        api.fail_next(500, "Failed to create task");

        let (created, ()) = futures::join!(board.create_task(june(14)), async {
            // The create is in flight with its pending copy on the board
            let pending = board.snapshot().column(june(14)).unwrap().tasks[0].key;
            board.delete_task(pending).await.unwrap();
            assert_eq!(board.discarded.lock().len(), 1);
            release.send(()).unwrap();
        });

        assert!(created.is_err());
        assert!(board.discarded.lock().is_empty());
        assert!(board.snapshot().column(june(14)).unwrap().is_empty());
    }
}
