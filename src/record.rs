// Storable entity contract

use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

/// Core trait that any storable record must implement
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Unique identifier within the collection
    fn id(&self) -> Uuid;

    /// Collection name for this record type (e.g., "tasks", "settings")
    fn collection_name() -> &'static str
    where
        Self: Sized;

    /// Ordering key; fetches return records sorted by `(sort_key, id)`
    fn sort_key(&self) -> i64 {
        0
    }
}
