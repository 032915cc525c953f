// Error taxonomy for the task data layer

use thiserror::Error;

/// Low-level failures raised by a persistent context
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to (de)serialize record: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid collection name: {0}")]
    InvalidCollection(String),

    #[error("fetch completed without delivering a result")]
    Disconnected,
}

/// Failures from the remote task source, passed through unchanged
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("request to {url} returned HTTP {code}")]
    Status { url: String, code: u16 },

    #[error("failed to decode response body: {0}")]
    Decode(#[source] std::io::Error),
}

/// Errors surfaced by the repositories and delivered to controller callbacks
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("could not get settings")]
    CouldNotGetSettings(#[source] StoreError),

    #[error("could not get tasks")]
    CouldNotGetTasks(#[source] StoreError),

    #[error("could not save task")]
    CouldNotSaveTask(#[source] StoreError),

    #[error(transparent)]
    Network(#[from] NetworkError),
}
