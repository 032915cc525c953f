// Task repository

use crate::context::{FetchRequest, PersistentContext, fetch_blocking};
use crate::error::TaskError;
use crate::models::{Task, TaskDraft};
use tracing::{debug, warn};
use uuid::Uuid;

/// CRUD over task records
///
/// Names are not validated here; an empty name is a valid stored state.
#[derive(Clone)]
pub struct TaskStore<C: PersistentContext> {
    context: C,
}

impl<C: PersistentContext> TaskStore<C> {
    pub fn new(context: C) -> Self {
        Self { context }
    }

    /// Every task, including staged ones, in creation order
    pub fn get_all(&self) -> Result<Vec<Task>, TaskError> {
        fetch_blocking(&self.context, FetchRequest::<Task>::all()).map_err(|e| {
            warn!(error = %e, "Failed to fetch tasks");
            TaskError::CouldNotGetTasks(e)
        })
    }

    pub fn count(&self) -> Result<usize, TaskError> {
        self.context
            .count(&FetchRequest::<Task>::all())
            .map_err(TaskError::CouldNotGetTasks)
    }

    /// Build a task and stage it; commit right away only if the draft asks to
    pub fn create(&self, draft: TaskDraft) -> Task {
        let persist = draft.persist_immediately;
        let task = draft.into_task();

        if let Err(e) = self.context.upsert(&task) {
            warn!(id = %task.id, error = %e, "Failed to stage new task");
            return task;
        }
        debug!(id = %task.id, persist, "Created task");

        if persist {
            self.context.save_if_changed();
        }
        task
    }

    /// Stage a changed task without committing
    pub fn update(&self, task: &Task) -> Result<(), TaskError> {
        self.context.upsert(task).map_err(TaskError::CouldNotSaveTask)
    }

    /// Delete a task and flush immediately (best effort)
    pub fn remove(&self, id: Uuid) {
        self.context.delete::<Task>(id);
        self.context.save_if_changed();
    }

    /// Best-effort commit of everything staged
    pub fn flush(&self) {
        self.context.save_if_changed();
    }

    /// Stage `task` and commit strictly
    ///
    /// On failure only this task is reverted, by re-staging `previous`. Other
    /// staged changes stay staged for the next flush.
    pub fn commit_task(&self, task: &Task, previous: &Task) -> Result<(), TaskError> {
        self.update(task)?;

        self.context.save().map_err(|e| {
            warn!(id = %task.id, error = %e, "Failed to commit task, reverting it");
            if let Err(restage) = self.context.upsert(previous) {
                warn!(id = %previous.id, error = %restage, "Failed to re-stage previous task");
            }
            TaskError::CouldNotSaveTask(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteContext;
    use crate::error::StoreError;
    use crate::testing::{FaultyContext, insert_corrupt_row, seed_tasks};
    use tempfile::TempDir;

    #[test]
    fn test_get_all_with_empty_store_returns_empty() {
        let temp = TempDir::new().unwrap();
        let store = TaskStore::new(SqliteContext::open(temp.path()).unwrap());

        let tasks = store.get_all().unwrap();
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_get_all_with_seeded_tasks_returns_all() {
        let temp = TempDir::new().unwrap();
        let context = SqliteContext::open(temp.path()).unwrap();
        seed_tasks(&context, 10);
        let store = TaskStore::new(context);

        let tasks = store.get_all().unwrap();
        assert_eq!(tasks.len(), 10);
        assert_eq!(tasks[0].name, "Test task #0");
        assert_eq!(tasks[9].name, "Test task #9");
    }

    #[test]
    fn test_get_all_execute_failure_maps_to_could_not_get_tasks() {
        let temp = TempDir::new().unwrap();
        let context = FaultyContext::open(temp.path());
        context.fail_execute(true);
        let store = TaskStore::new(context);

        let result = store.get_all();
        assert!(matches!(result, Err(TaskError::CouldNotGetTasks(_))));
    }

    #[test]
    fn test_create_with_persist_saves_to_db() {
        let temp = TempDir::new().unwrap();
        let context = SqliteContext::open(temp.path()).unwrap();
        let store = TaskStore::new(context.clone());

        store.create(TaskDraft::new("X").persist());

        assert!(!context.has_changes());
        let tasks = store.get_all().unwrap();
        assert!(tasks.iter().any(|t| t.name == "X"));
    }

    #[test]
    fn test_create_without_persist_only_stages() {
        let temp = TempDir::new().unwrap();
        let context = SqliteContext::open(temp.path()).unwrap();
        let store = TaskStore::new(context.clone());

        let task = store.create(TaskDraft::new("Staged"));

        assert!(context.has_changes());
        assert_eq!(store.count().unwrap(), 1);
        context.rollback();
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(task.name, "Staged");
    }

    #[test]
    fn test_create_with_empty_name_is_accepted() {
        let temp = TempDir::new().unwrap();
        let context = SqliteContext::open(temp.path()).unwrap();
        let store = TaskStore::new(context.clone());

        let task = store.create(TaskDraft::new("").persist());

        assert!(!context.has_changes());
        let tasks = store.get_all().unwrap();
        assert_eq!(tasks, vec![task]);
    }

    #[test]
    fn test_create_with_persist_and_failing_save_keeps_changes_staged() {
        let temp = TempDir::new().unwrap();
        let context = FaultyContext::open(temp.path());
        context.fail_save(true);
        let store = TaskStore::new(context.clone());

        store.create(TaskDraft::new("Unsaved").persist());

        assert!(context.has_changes());
        context.rollback();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_remove_existing_task_deletes_from_db() {
        let temp = TempDir::new().unwrap();
        let context = SqliteContext::open(temp.path()).unwrap();
        let seeded = seed_tasks(&context, 10);
        let store = TaskStore::new(context.clone());

        store.remove(seeded[0].id);

        assert!(!context.has_changes());
        assert_eq!(store.count().unwrap(), 9);
    }

    #[test]
    fn test_remove_unsaved_task_leaves_count_unchanged() {
        let temp = TempDir::new().unwrap();
        let context = SqliteContext::open(temp.path()).unwrap();
        seed_tasks(&context, 3);
        let store = TaskStore::new(context);

        let task = store.create(TaskDraft::new("Never saved"));
        store.remove(task.id);

        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_commit_task_persists_update() {
        let temp = TempDir::new().unwrap();
        let context = SqliteContext::open(temp.path()).unwrap();
        let store = TaskStore::new(context.clone());

        let task = store.create(TaskDraft::new("Draft").persist());
        let mut renamed = task.clone();
        renamed.name = "Final".to_string();
        store.commit_task(&renamed, &task).unwrap();

        assert!(!context.has_changes());
        let tasks = store.get_all().unwrap();
        assert_eq!(tasks[0].name, "Final");
    }

    #[test]
    fn test_commit_task_failure_reverts_only_that_task() {
        let temp = TempDir::new().unwrap();
        let context = FaultyContext::open(temp.path());
        let seeded = seed_tasks(&context, 2);
        let store = TaskStore::new(context.clone());

        context.fail_save(true);
        let mut toggled = seeded[0].clone();
        toggled.is_completed = !toggled.is_completed;
        store.update(&toggled).unwrap();
        store.flush();

        let mut renamed = seeded[1].clone();
        renamed.name = "Changed".to_string();
        let result = store.commit_task(&renamed, &seeded[1]);
        assert!(matches!(result, Err(TaskError::CouldNotSaveTask(_))));

        context.fail_save(false);
        store.flush();

        let tasks = store.get_all().unwrap();
        assert_eq!(tasks[0], toggled);
        assert_eq!(tasks[1], seeded[1]);
        assert!(!context.has_changes());
    }

    #[test]
    fn test_get_all_with_corrupt_row_maps_to_could_not_get_tasks() {
        let temp = TempDir::new().unwrap();
        let context = SqliteContext::open(temp.path()).unwrap();
        seed_tasks(&context, 2);
        insert_corrupt_row(temp.path(), "tasks");
        let store = TaskStore::new(context);

        let result = store.get_all();
        assert!(matches!(result, Err(TaskError::CouldNotGetTasks(StoreError::Serde(_)))));
    }
}
