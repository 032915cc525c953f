// Transactional handle to the local store

use crate::error::StoreError;
use crate::record::Record;
use std::marker::PhantomData;
use std::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Fetch of every record of one type, optionally limited
#[derive(Debug)]
pub struct FetchRequest<T: Record> {
    limit: Option<usize>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Record> FetchRequest<T> {
    pub fn all() -> Self {
        Self {
            limit: None,
            _marker: PhantomData,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn max_results(&self) -> Option<usize> {
        self.limit
    }
}

impl<T: Record> Clone for FetchRequest<T> {
    fn clone(&self) -> Self {
        Self {
            limit: self.limit,
            _marker: PhantomData,
        }
    }
}

pub type FetchCompletion<T> = Box<dyn FnOnce(Result<Vec<T>, StoreError>) + Send + 'static>;

/// A fetch whose result is delivered to `completion` exactly once
pub struct AsyncFetchRequest<T: Record> {
    pub request: FetchRequest<T>,
    pub completion: FetchCompletion<T>,
}

impl<T: Record> AsyncFetchRequest<T> {
    pub fn new<F>(request: FetchRequest<T>, completion: F) -> Self
    where
        F: FnOnce(Result<Vec<T>, StoreError>) + Send + 'static,
    {
        Self {
            request,
            completion: Box::new(completion),
        }
    }
}

/// Shared transaction scope over the local store
///
/// Clones share one staging area: every clone observes the uncommitted
/// changes of every other clone. There is no internal isolation, so only one
/// logical writer sequence may be active at a time.
pub trait PersistentContext: Clone + Send + Sync + 'static {
    /// Schedule an asynchronous fetch. An `Err` here is a store-level
    /// execution error; otherwise the completion fires later on another thread.
    fn execute<T: Record>(&self, request: AsyncFetchRequest<T>) -> Result<(), StoreError>;

    /// Fetch records, including staged changes
    fn fetch<T: Record>(&self, request: &FetchRequest<T>) -> Result<Vec<T>, StoreError>;

    /// Count records, including staged changes
    fn count<T: Record>(&self, request: &FetchRequest<T>) -> Result<usize, StoreError>;

    /// Stage an insert or update
    fn upsert<T: Record>(&self, record: &T) -> Result<(), StoreError>;

    /// Stage a deletion
    fn delete<T: Record>(&self, id: Uuid);

    /// Whether there are staged changes not yet committed
    fn has_changes(&self) -> bool;

    /// Commit all staged changes atomically
    fn save(&self) -> Result<(), StoreError>;

    /// Discard all staged changes
    fn rollback(&self);

    /// Best-effort flush: commits only when dirty, never fails
    fn save_if_changed(&self) {
        if !self.has_changes() {
            return;
        }

        if let Err(e) = self.save() {
            warn!(error = %e, "Failed to save the context, changes remain staged");
        }
    }
}

/// Run an asynchronous fetch and block until its single completion fires
///
/// Blocks the calling thread; never call this from an interactive thread.
pub fn fetch_blocking<C, T>(context: &C, request: FetchRequest<T>) -> Result<Vec<T>, StoreError>
where
    C: PersistentContext,
    T: Record,
{
    let (tx, rx) = mpsc::sync_channel(1);

    context.execute(AsyncFetchRequest::new(request, move |result| {
        // Receiver only disappears if the caller is gone
        let _ = tx.send(result);
    }))?;

    let result = rx.recv().map_err(|_| StoreError::Disconnected)?;
    debug!(
        collection = T::collection_name(),
        ok = result.is_ok(),
        "fetch_blocking: completion received"
    );
    result
}
