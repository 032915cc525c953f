// Test doubles shared by the unit tests

use crate::context::{AsyncFetchRequest, FetchRequest, PersistentContext};
use crate::error::{NetworkError, StoreError};
use crate::models::{Task, TaskDraft};
use crate::record::Record;
use crate::remote::{RemoteTask, TaskSource};
use crate::store::SqliteContext;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

/// SQLite context that can be told to fail `execute` or `save`
#[derive(Clone)]
pub struct FaultyContext {
    inner: SqliteContext,
    fail_execute: Arc<AtomicBool>,
    fail_save: Arc<AtomicBool>,
}

impl FaultyContext {
    pub fn open(path: &Path) -> Self {
        Self {
            inner: SqliteContext::open(path).unwrap(),
            fail_execute: Arc::new(AtomicBool::new(false)),
            fail_save: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn fail_execute(&self, fail: bool) {
        self.fail_execute.store(fail, Ordering::SeqCst);
    }

    pub fn fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }
}

fn injected(what: &str) -> StoreError {
    StoreError::Io(std::io::Error::other(format!("injected {} failure", what)))
}

impl PersistentContext for FaultyContext {
    fn execute<T: Record>(&self, request: AsyncFetchRequest<T>) -> Result<(), StoreError> {
        if self.fail_execute.load(Ordering::SeqCst) {
            return Err(injected("execute"));
        }
        self.inner.execute(request)
    }

    fn fetch<T: Record>(&self, request: &FetchRequest<T>) -> Result<Vec<T>, StoreError> {
        self.inner.fetch(request)
    }

    fn count<T: Record>(&self, request: &FetchRequest<T>) -> Result<usize, StoreError> {
        self.inner.count(request)
    }

    fn upsert<T: Record>(&self, record: &T) -> Result<(), StoreError> {
        self.inner.upsert(record)
    }

    fn delete<T: Record>(&self, id: Uuid) {
        self.inner.delete::<T>(id)
    }

    fn has_changes(&self) -> bool {
        self.inner.has_changes()
    }

    fn save(&self) -> Result<(), StoreError> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(injected("save"));
        }
        self.inner.save()
    }

    fn rollback(&self) {
        self.inner.rollback()
    }
}

/// Remote source returning canned tasks, or unreachable when given none
#[derive(Clone, Default)]
pub struct StubTaskSource {
    tasks: Arc<Mutex<Option<Vec<RemoteTask>>>>,
    calls: Arc<AtomicUsize>,
}

impl StubTaskSource {
    pub fn returning(tasks: Vec<RemoteTask>) -> Self {
        Self {
            tasks: Arc::new(Mutex::new(Some(tasks))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TaskSource for StubTaskSource {
    fn fetch_all(&self) -> Result<Vec<RemoteTask>, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tasks.lock().clone().ok_or_else(|| NetworkError::Transport {
            url: "stub://todos".to_string(),
            message: "connection refused".to_string(),
        })
    }
}

pub fn remote_task(id: i64, name: &str, is_completed: bool) -> RemoteTask {
    RemoteTask {
        id,
        name: name.to_string(),
        is_completed,
        user_id: 1,
    }
}

/// Commit a row whose document is not valid JSON, behind the context's back
pub fn insert_corrupt_row(path: &Path, collection: &str) {
    let db = rusqlite::Connection::open(path.join(".tasklist").join("tasklist.db")).unwrap();
    db.execute(
        "INSERT INTO records (collection, id, data_json, sort_key) VALUES (?1, ?2, ?3, 0)",
        rusqlite::params![collection, Uuid::now_v7().to_string(), "{\"truncated\": "],
    )
    .unwrap();
}

/// Commit `count` tasks: details on even indices, completed on multiples of 3
pub fn seed_tasks<C: PersistentContext>(context: &C, count: usize) -> Vec<Task> {
    let base = Utc::now() - Duration::hours(1);
    let mut tasks = Vec::with_capacity(count);

    for i in 0..count {
        let mut draft = TaskDraft::new(format!("Test task #{}", i))
            .created_at(base + Duration::milliseconds(i as i64))
            .completed(i % 3 == 0);
        if i % 2 == 0 {
            draft = draft.details("Test task with some details");
        }

        let task = draft.into_task();
        context.upsert(&task).unwrap();
        tasks.push(task);
    }

    context.save().unwrap();
    tasks
}
