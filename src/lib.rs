// TaskList - local task store with a one-time remote seed and in-memory search

pub mod context;
pub mod controller;
pub mod error;
pub mod filter;
pub mod models;
pub mod record;
pub mod remote;
pub mod settings;
pub mod store;
pub mod sync;
pub mod tasks;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use context::{AsyncFetchRequest, FetchRequest, PersistentContext, fetch_blocking};
pub use controller::TaskListController;
pub use error::{NetworkError, StoreError, TaskError};
pub use models::{Settings, Task, TaskDraft};
pub use record::Record;
pub use remote::{DEFAULT_BASE_URL, HttpTaskSource, RemoteTask, TaskSource};
pub use settings::SettingsStore;
pub use store::SqliteContext;
pub use sync::{FETCHED_TASK_DETAILS, SyncOutcome, TaskSyncEngine};
pub use tasks::TaskStore;
