// First-launch gated sync from the remote source

use crate::context::PersistentContext;
use crate::error::TaskError;
use crate::models::TaskDraft;
use crate::remote::TaskSource;
use crate::settings::SettingsStore;
use crate::tasks::TaskStore;
use tracing::{info, warn};

/// Details attached to every task imported from the remote source
pub const FETCHED_TASK_DETAILS: &str = "Fetched todo without description.";

/// What a sync attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The gate was already cleared; nothing was fetched
    AlreadySynced,
    /// Remote tasks were imported and the gate cleared
    Imported(usize),
    /// The final commit failed; the batch was rolled back and the gate stays set
    Discarded(usize),
}

/// Fetch remote tasks once, persist them, then clear the gate flag
pub struct TaskSyncEngine<C: PersistentContext, S: TaskSource> {
    context: C,
    settings: SettingsStore<C>,
    tasks: TaskStore<C>,
    source: S,
}

impl<C: PersistentContext, S: TaskSource> TaskSyncEngine<C, S> {
    pub fn new(context: C, source: S) -> Self {
        Self {
            settings: SettingsStore::new(context.clone()),
            tasks: TaskStore::new(context.clone()),
            context,
            source,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run the import if the settings gate is still set
    ///
    /// A network failure leaves the gate untouched so the next call retries.
    /// The tasks and the cleared gate are committed in one transaction; a
    /// failed commit is logged rather than raised.
    pub fn sync_if_needed(&self) -> Result<SyncOutcome, TaskError> {
        let mut settings = self.settings.get_or_create()?;
        if !settings.needs_initial_sync {
            return Ok(SyncOutcome::AlreadySynced);
        }

        let remote = self.source.fetch_all()?;
        let count = remote.len();

        for task in remote {
            self.tasks.create(
                TaskDraft::new(task.name)
                    .completed(task.is_completed)
                    .details(FETCHED_TASK_DETAILS),
            );
        }

        settings.needs_initial_sync = false;
        self.settings.stage(&settings)?;

        if let Err(e) = self.context.save() {
            warn!(error = %e, count, "Failed to commit initial sync, discarding imported tasks");
            self.context.rollback();
            return Ok(SyncOutcome::Discarded(count));
        }

        info!(count, "Initial sync complete");
        Ok(SyncOutcome::Imported(count))
    }
}
