// Singleton settings repository

use crate::context::{FetchRequest, PersistentContext, fetch_blocking};
use crate::error::{StoreError, TaskError};
use crate::models::Settings;
use tracing::{debug, info, warn};

/// Exposes the single settings record, creating it on first access
#[derive(Clone)]
pub struct SettingsStore<C: PersistentContext> {
    context: C,
}

impl<C: PersistentContext> SettingsStore<C> {
    pub fn new(context: C) -> Self {
        Self { context }
    }

    /// Return the settings record, creating and persisting a default one if
    /// the store has none. A failed fetch is reported, never papered over.
    pub fn get_or_create(&self) -> Result<Settings, TaskError> {
        let found = fetch_blocking(&self.context, FetchRequest::<Settings>::all().limit(1)).map_err(|e| {
            warn!(error = %e, "Failed to fetch settings");
            TaskError::CouldNotGetSettings(e)
        })?;

        match found.into_iter().next() {
            Some(settings) => {
                debug!(id = %settings.id, needs_initial_sync = settings.needs_initial_sync, "Found settings");
                Ok(settings)
            }
            None => self.create().map_err(TaskError::CouldNotGetSettings),
        }
    }

    /// Stage a changed settings record; the caller decides when to commit
    pub fn stage(&self, settings: &Settings) -> Result<(), TaskError> {
        self.context.upsert(settings).map_err(TaskError::CouldNotGetSettings)
    }

    fn create(&self) -> Result<Settings, StoreError> {
        let settings = Settings::default();
        self.context.upsert(&settings)?;
        self.context.save_if_changed();

        info!(id = %settings.id, "Created default settings");
        Ok(settings)
    }
}
