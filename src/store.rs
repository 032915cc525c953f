// SQLite-backed persistent context with an in-memory staging area

use crate::context::{AsyncFetchRequest, FetchRequest, PersistentContext};
use crate::error::StoreError;
use crate::record::Record;
use eyre::{Result, WrapErr};
use fs2::FileExt;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};
use uuid::Uuid;

const CURRENT_VERSION: u32 = 1;
const STORE_DIR: &str = ".tasklist";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RecordKey {
    collection: &'static str,
    id: Uuid,
}

#[derive(Debug, Clone)]
enum StagedChange {
    Upsert { data_json: String, sort_key: i64 },
    Delete,
}

struct ContextInner {
    db: Connection,
    staged: HashMap<RecordKey, StagedChange>,
}

/// Persistent context backed by a SQLite database
///
/// Cloning is cheap; all clones share the connection and the staging area.
#[derive(Clone)]
pub struct SqliteContext {
    base_path: Arc<PathBuf>,
    inner: Arc<Mutex<ContextInner>>,
}

impl SqliteContext {
    /// Open or create a store at the given path
    ///
    /// The store lives in a `.tasklist` subdirectory of the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().join(STORE_DIR);

        fs::create_dir_all(&base_path).wrap_err("Failed to create store directory")?;

        let db_path = base_path.join("tasklist.db");
        let db = Connection::open(&db_path).wrap_err("Failed to open SQLite database")?;

        create_schema(&db).wrap_err("Failed to create database schema")?;
        write_version(&base_path)?;

        info!(path = ?base_path, "Opened task store");

        Ok(Self {
            base_path: Arc::new(base_path),
            inner: Arc::new(Mutex::new(ContextInner {
                db,
                staged: HashMap::new(),
            })),
        })
    }

    /// Get the base path of this store
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn lock_path(&self) -> PathBuf {
        self.base_path.join("tasklist.lock")
    }
}

fn create_schema(db: &Connection) -> rusqlite::Result<()> {
    debug!("Creating database schema");

    db.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS records (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            data_json TEXT NOT NULL,
            sort_key INTEGER NOT NULL,
            PRIMARY KEY (collection, id)
        );

        CREATE INDEX IF NOT EXISTS idx_records_sort ON records(collection, sort_key);
        "#,
    )
}

fn write_version(base_path: &Path) -> Result<()> {
    let version_path = base_path.join(".version");
    if !version_path.exists() {
        fs::write(version_path, CURRENT_VERSION.to_string()).wrap_err("Failed to write version file")?;
    }
    Ok(())
}

fn validate_collection_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty()
        || name.len() > 64
        || !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        return Err(StoreError::InvalidCollection(name.to_string()));
    }
    Ok(())
}

impl ContextInner {
    /// Committed rows overlaid with staged changes, in fetch order
    fn visible_rows(&self, collection: &'static str) -> Result<Vec<(Uuid, String)>, StoreError> {
        let mut rows: BTreeMap<(i64, Uuid), String> = BTreeMap::new();
        let mut sort_keys: HashMap<Uuid, i64> = HashMap::new();

        {
            let mut stmt = self
                .db
                .prepare("SELECT id, data_json, sort_key FROM records WHERE collection = ?1")?;
            let committed = stmt.query_map([collection], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?;

            for row in committed {
                let (id, data_json, sort_key) = row?;
                let id = Uuid::parse_str(&id).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
                })?;
                sort_keys.insert(id, sort_key);
                rows.insert((sort_key, id), data_json);
            }
        }

        for (key, change) in &self.staged {
            if key.collection != collection {
                continue;
            }

            if let Some(old_sort_key) = sort_keys.remove(&key.id) {
                rows.remove(&(old_sort_key, key.id));
            }

            if let StagedChange::Upsert { data_json, sort_key } = change {
                sort_keys.insert(key.id, *sort_key);
                rows.insert((*sort_key, key.id), data_json.clone());
            }
        }

        Ok(rows.into_iter().map(|((_, id), data_json)| (id, data_json)).collect())
    }

    fn fetch<T: Record>(&self, request: &FetchRequest<T>) -> Result<Vec<T>, StoreError> {
        let rows = self.visible_rows(T::collection_name())?;
        let limit = request.max_results().unwrap_or(usize::MAX);

        let mut results = Vec::new();
        for (_, data_json) in rows.into_iter().take(limit) {
            let record: T = serde_json::from_str(&data_json)?;
            results.push(record);
        }

        debug!(collection = T::collection_name(), count = results.len(), "fetch: done");
        Ok(results)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        let tx = self.db.transaction()?;

        for (key, change) in &self.staged {
            match change {
                StagedChange::Upsert { data_json, sort_key } => {
                    tx.execute(
                        "INSERT OR REPLACE INTO records (collection, id, data_json, sort_key)
                         VALUES (?1, ?2, ?3, ?4)",
                        rusqlite::params![key.collection, key.id.to_string(), data_json, sort_key],
                    )?;
                }
                StagedChange::Delete => {
                    tx.execute(
                        "DELETE FROM records WHERE collection = ?1 AND id = ?2",
                        rusqlite::params![key.collection, key.id.to_string()],
                    )?;
                }
            }
        }

        tx.commit()?;
        Ok(())
    }
}

impl PersistentContext for SqliteContext {
    fn execute<T: Record>(&self, request: AsyncFetchRequest<T>) -> Result<(), StoreError> {
        validate_collection_name(T::collection_name())?;

        let inner = Arc::clone(&self.inner);
        thread::Builder::new()
            .name("tasklist-fetch".to_string())
            .spawn(move || {
                let AsyncFetchRequest { request, completion } = request;
                // Release the lock before handing the result over
                let result = inner.lock().fetch(&request);
                completion(result);
            })?;

        Ok(())
    }

    fn fetch<T: Record>(&self, request: &FetchRequest<T>) -> Result<Vec<T>, StoreError> {
        validate_collection_name(T::collection_name())?;
        self.inner.lock().fetch(request)
    }

    fn count<T: Record>(&self, request: &FetchRequest<T>) -> Result<usize, StoreError> {
        validate_collection_name(T::collection_name())?;
        let rows = self.inner.lock().visible_rows(T::collection_name())?;
        Ok(request.max_results().map_or(rows.len(), |limit| rows.len().min(limit)))
    }

    fn upsert<T: Record>(&self, record: &T) -> Result<(), StoreError> {
        let collection = T::collection_name();
        validate_collection_name(collection)?;

        let data_json = serde_json::to_string(record)?;
        let key = RecordKey {
            collection,
            id: record.id(),
        };
        debug!(collection, id = %key.id, "upsert: staged");

        self.inner.lock().staged.insert(
            key,
            StagedChange::Upsert {
                data_json,
                sort_key: record.sort_key(),
            },
        );
        Ok(())
    }

    fn delete<T: Record>(&self, id: Uuid) {
        let collection = T::collection_name();
        debug!(collection, %id, "delete: staged");

        self.inner
            .lock()
            .staged
            .insert(RecordKey { collection, id }, StagedChange::Delete);
    }

    fn has_changes(&self) -> bool {
        !self.inner.lock().staged.is_empty()
    }

    fn save(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.staged.is_empty() {
            return Ok(());
        }

        let lock_file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;

        // Lock is released when the file is dropped
        lock_file.lock_exclusive()?;

        inner.commit()?;

        let count = inner.staged.len();
        inner.staged.clear();
        debug!(count, "save: committed staged changes");
        Ok(())
    }

    fn rollback(&self) {
        let mut inner = self.inner.lock();
        if !inner.staged.is_empty() {
            debug!(count = inner.staged.len(), "rollback: discarding staged changes");
        }
        inner.staged.clear();
    }
}
