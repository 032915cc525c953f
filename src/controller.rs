// In-memory task list with a filtered view

use crate::context::PersistentContext;
use crate::error::TaskError;
use crate::filter;
use crate::models::Task;
use crate::remote::TaskSource;
use crate::sync::{SyncOutcome, TaskSyncEngine};
use crate::tasks::TaskStore;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Owns the loaded task list and the filtered view over it
///
/// `all_tasks` is the single authoritative copy of every task. The filtered
/// view is kept as an ordered list of ids resolved against `all_tasks`, so a
/// change to a task is visible through both views.
///
/// `load` and `sync_if_needed` block on store and network work and must run
/// off the interactive thread. Mutating calls take `&mut self`; callers that
/// share a controller across threads serialize through their own lock.
/// `sync_if_needed` should finish before the following `load`.
pub struct TaskListController<C: PersistentContext, S: TaskSource> {
    store: TaskStore<C>,
    sync: TaskSyncEngine<C, S>,
    all_tasks: Vec<Task>,
    filtered_ids: Vec<Uuid>,
    filtering_active: bool,
}

impl<C: PersistentContext, S: TaskSource> TaskListController<C, S> {
    pub fn new(context: C, source: S) -> Self {
        Self {
            store: TaskStore::new(context.clone()),
            sync: TaskSyncEngine::new(context, source),
            all_tasks: Vec::new(),
            filtered_ids: Vec::new(),
            filtering_active: false,
        }
    }

    /// Repository used by this controller, for creating tasks
    pub fn store(&self) -> &TaskStore<C> {
        &self.store
    }

    pub fn all_tasks(&self) -> &[Task] {
        &self.all_tasks
    }

    pub fn filtered_tasks(&self) -> Vec<&Task> {
        let by_id: HashMap<Uuid, &Task> = self.all_tasks.iter().map(|t| (t.id, t)).collect();
        self.filtered_ids.iter().filter_map(|id| by_id.get(id).copied()).collect()
    }

    pub fn is_filtering_active(&self) -> bool {
        self.filtering_active
    }

    /// Tasks to present: the filtered view while filtering, otherwise all
    pub fn visible_tasks(&self) -> Vec<&Task> {
        if self.filtering_active {
            self.filtered_tasks()
        } else {
            self.all_tasks.iter().collect()
        }
    }

    pub fn find(&self, id: Uuid) -> Option<&Task> {
        self.all_tasks.iter().find(|t| t.id == id)
    }

    /// Run the first-launch import if still needed
    pub fn sync_if_needed(&mut self, on_error: impl FnOnce(TaskError)) {
        match self.sync.sync_if_needed() {
            Ok(SyncOutcome::AlreadySynced) => debug!("Initial sync not needed"),
            Ok(outcome) => info!(?outcome, "Initial sync finished"),
            Err(e) => {
                warn!(error = %e, "Initial sync failed");
                on_error(e);
            }
        }
    }

    /// Replace the task list with the store's contents; unchanged on failure
    pub fn load(&mut self, on_error: impl FnOnce(TaskError)) {
        match self.store.get_all() {
            Ok(tasks) => {
                debug!(count = tasks.len(), "Loaded tasks");
                self.all_tasks = tasks;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load tasks");
                on_error(e);
            }
        }
    }

    pub fn set_filter_active(&mut self, active: bool) {
        self.filtering_active = active;
    }

    /// Recompute the filtered view from the current task list
    pub fn filter(&mut self, query: Option<&str>) {
        self.filtered_ids = filter::filter_tasks(&self.all_tasks, query).map(|t| t.id).collect();
        debug!(count = self.filtered_ids.len(), "Filtered tasks");
    }

    /// Append an already persisted task; the filtered view is left alone
    pub fn add(&mut self, task: Task) {
        self.all_tasks.push(task);
    }

    /// Delete a task from the store and from both views
    pub fn remove(&mut self, id: Uuid) {
        self.store.remove(id);

        if let Some(index) = self.all_tasks.iter().position(|t| t.id == id) {
            self.all_tasks.remove(index);
        }
        if let Some(index) = self.filtered_ids.iter().position(|f| *f == id) {
            self.filtered_ids.remove(index);
        }
    }

    /// Flip the completion flag and flush it (best effort)
    pub fn toggle_completion(&mut self, id: Uuid) {
        let Some(task) = self.all_tasks.iter_mut().find(|t| t.id == id) else {
            debug!(%id, "toggle_completion: task not loaded");
            return;
        };

        task.is_completed = !task.is_completed;
        if let Err(e) = self.store.update(task) {
            warn!(%id, error = %e, "Failed to stage completion change");
            return;
        }
        self.store.flush();
    }

    /// Change a task's name and details
    ///
    /// Returns false without touching the store when nothing changed or the
    /// task is not loaded. A failed commit is reported; memory is left as it
    /// was and only this task's staged change is reverted.
    pub fn edit(&mut self, id: Uuid, name: &str, details: Option<&str>, on_error: impl FnOnce(TaskError)) -> bool {
        let Some(index) = self.all_tasks.iter().position(|t| t.id == id) else {
            return false;
        };

        let current = &self.all_tasks[index];
        if current.name == name && current.details.as_deref() == details {
            return false;
        }

        let mut edited = current.clone();
        edited.name = name.to_string();
        edited.details = details.map(str::to_string);

        if let Err(e) = self.store.commit_task(&edited, current) {
            on_error(e);
            return false;
        }

        self.all_tasks[index] = edited;
        true
    }
}
