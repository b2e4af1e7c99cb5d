pub mod init;
pub mod inspect;
pub mod reconcile;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use nodepool_affinity::MemoryBackend;
use nodepool_state::StatusStore;

const STATUS_FILE: &str = "status.redb";
const BACKEND_FILE: &str = "backend.json";

/// Status store and simulated backend kept under one data directory.
pub struct Workspace {
    backend_path: PathBuf,
    pub store: StatusStore,
    pub backend: Arc<MemoryBackend>,
}

impl Workspace {
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let store = StatusStore::open(&data_dir.join(STATUS_FILE))?;

        let backend_path = data_dir.join(BACKEND_FILE);
        let backend = if backend_path.exists() {
            MemoryBackend::from_json(&std::fs::read_to_string(&backend_path)?)?
        } else {
            MemoryBackend::new()
        };

        Ok(Self {
            backend_path,
            store,
            backend: Arc::new(backend),
        })
    }

    pub fn save_backend(&self) -> anyhow::Result<()> {
        std::fs::write(&self.backend_path, self.backend.to_json()?)?;
        Ok(())
    }
}
