//! StatusStore: redb-backed persistence for worker status.
//!
//! Stands in for the orchestrator's status subresource: one JSON-encoded
//! `WorkerStatus` per owner id. Supports on-disk and in-memory backends
//! (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::WORKER_STATUS;
use crate::types::WorkerStatus;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
    ($variant:ident, $owner:expr) => {
        |e| StateError::$variant {
            owner: $owner.to_string(),
            message: e.to_string(),
        }
    };
}

/// Thread-safe status store backed by redb.
#[derive(Clone)]
pub struct StatusStore {
    db: Arc<Database>,
}

impl StatusStore {
    /// Open (or create) a persistent status store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "status store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory status store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory status store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Storage))?;
        txn.open_table(WORKER_STATUS).map_err(map_err!(Storage))?;
        txn.commit().map_err(map_err!(Storage))?;
        Ok(())
    }

    /// Insert or replace the status for `owner_id`.
    pub fn put_status(&self, owner_id: &str, status: &WorkerStatus) -> StateResult<()> {
        let value = serde_json::to_vec(status).map_err(map_err!(Encode, owner_id))?;
        let txn = self.db.begin_write().map_err(map_err!(Storage))?;
        {
            let mut table = txn.open_table(WORKER_STATUS).map_err(map_err!(Storage))?;
            table
                .insert(owner_id, value.as_slice())
                .map_err(map_err!(Storage))?;
        }
        txn.commit().map_err(map_err!(Storage))?;
        debug!(
            owner = owner_id,
            affinity_groups = status.affinity_groups.len(),
            machine_images = status.machine_images.len(),
            "worker status stored"
        );
        Ok(())
    }

    /// Get the status for `owner_id`, if one was ever stored.
    pub fn get_status(&self, owner_id: &str) -> StateResult<Option<WorkerStatus>> {
        let txn = self.db.begin_read().map_err(map_err!(Storage))?;
        let table = txn.open_table(WORKER_STATUS).map_err(map_err!(Storage))?;
        match table.get(owner_id).map_err(map_err!(Storage))? {
            Some(guard) => {
                let status: WorkerStatus =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Corrupt, owner_id))?;
                Ok(Some(status))
            }
            None => Ok(None),
        }
    }

    /// Like [`get_status`](Self::get_status) but a missing record is an error.
    pub fn require_status(&self, owner_id: &str) -> StateResult<WorkerStatus> {
        self.get_status(owner_id)?
            .ok_or_else(|| StateError::NotFound(owner_id.to_string()))
    }

    /// List the owner ids that have a stored status.
    pub fn list_owners(&self) -> StateResult<Vec<String>> {
        let txn = self.db.begin_read().map_err(map_err!(Storage))?;
        let table = txn.open_table(WORKER_STATUS).map_err(map_err!(Storage))?;
        let mut owners = Vec::new();
        for entry in table.iter().map_err(map_err!(Storage))? {
            let (key, _) = entry.map_err(map_err!(Storage))?;
            owners.push(key.value().to_string());
        }
        Ok(owners)
    }

    /// Delete the status for `owner_id`. Returns true if it existed.
    pub fn delete_status(&self, owner_id: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Storage))?;
        let existed;
        {
            let mut table = txn.open_table(WORKER_STATUS).map_err(map_err!(Storage))?;
            existed = table.remove(owner_id).map_err(map_err!(Storage))?.is_some();
        }
        txn.commit().map_err(map_err!(Storage))?;
        debug!(owner = owner_id, existed, "worker status deleted");
        Ok(existed)
    }
}
