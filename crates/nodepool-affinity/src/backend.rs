//! Affinity group backend.
//!
//! [`GroupBackend`] abstracts the cloud API that owns server groups.
//! Calls are synchronous; the reconciler issues them one at a time.
//! [`MemoryBackend`] implements it in-process for tests and dry runs.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// A backend affinity group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub policy: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("affinity group {0} not found")]
    NotFound(String),

    #[error("backend request failed: {0}")]
    Api(String),
}

/// Backend client for affinity groups.
pub trait GroupBackend: Send + Sync {
    /// Create a group. Names need not be unique on the backend.
    fn create_group(&self, name: &str, policy: &str) -> Result<Group, BackendError>;
    /// Fetch a group. A missing group is [`BackendError::NotFound`].
    fn get_group(&self, id: &str) -> Result<Group, BackendError>;
    fn list_groups(&self) -> Result<Vec<Group>, BackendError>;
    /// Delete a group. A missing group is [`BackendError::NotFound`].
    fn delete_group(&self, id: &str) -> Result<(), BackendError>;
}

// ── MemoryBackend ─────────────────────────────────────────────────

/// Backend operations, for call counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Get,
    List,
    Delete,
}

/// Calls issued per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallCounts {
    pub create: u32,
    pub get: u32,
    pub list: u32,
    pub delete: u32,
}

impl CallCounts {
    /// Calls that change backend state.
    pub fn mutating(&self) -> u32 {
        self.create + self.delete
    }

    fn bump(&mut self, op: Operation) {
        match op {
            Operation::Create => self.create += 1,
            Operation::Get => self.get += 1,
            Operation::List => self.list += 1,
            Operation::Delete => self.delete += 1,
        }
    }
}

/// Serializable contents of a [`MemoryBackend`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub next_id: u64,
    pub groups: Vec<Group>,
}

#[derive(Debug, Default)]
struct MemoryState {
    groups: BTreeMap<String, Group>,
    next_id: u64,
    calls: CallCounts,
    failures: BTreeMap<Operation, String>,
}

/// In-process group backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: MemorySnapshot) -> Self {
        let groups = snapshot
            .groups
            .into_iter()
            .map(|g| (g.id.clone(), g))
            .collect();
        Self {
            state: Mutex::new(MemoryState {
                groups,
                next_id: snapshot.next_id,
                ..Default::default()
            }),
        }
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        let state = self.lock();
        MemorySnapshot {
            next_id: state.next_id,
            groups: state.groups.values().cloned().collect(),
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        Ok(Self::from_snapshot(serde_json::from_str(json)?))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }

    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    pub fn reset_calls(&self) {
        self.lock().calls = CallCounts::default();
    }

    /// Make the next call of `op` fail with [`BackendError::Api`].
    pub fn fail_next(&self, op: Operation, message: &str) {
        self.lock().failures.insert(op, message.to_string());
    }

    /// Insert a group directly, bypassing call counting.
    pub fn seed(&self, name: &str, policy: &str) -> Group {
        let mut state = self.lock();
        let group = state.allocate(name, policy);
        state.groups.insert(group.id.clone(), group.clone());
        group
    }

    /// Remove a group directly, as if deleted out of band.
    pub fn evict(&self, id: &str) -> Option<Group> {
        self.lock().groups.remove(id)
    }

    pub fn groups(&self) -> Vec<Group> {
        self.lock().groups.values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Count the call and apply any injected failure.
    fn begin(&self, op: Operation) -> Result<MutexGuard<'_, MemoryState>, BackendError> {
        let mut state = self.lock();
        state.calls.bump(op);
        let failure = state.failures.remove(&op);
        match failure {
            Some(message) => Err(BackendError::Api(message)),
            None => Ok(state),
        }
    }
}

impl MemoryState {
    fn allocate(&mut self, name: &str, policy: &str) -> Group {
        self.next_id += 1;
        Group {
            id: format!("sg-{:06}", self.next_id),
            name: name.to_string(),
            policy: policy.to_string(),
        }
    }
}

impl GroupBackend for MemoryBackend {
    fn create_group(&self, name: &str, policy: &str) -> Result<Group, BackendError> {
        let mut state = self.begin(Operation::Create)?;
        let group = state.allocate(name, policy);
        state.groups.insert(group.id.clone(), group.clone());
        debug!(id = %group.id, name, policy, "memory backend: group created");
        Ok(group)
    }

    fn get_group(&self, id: &str) -> Result<Group, BackendError> {
        let state = self.begin(Operation::Get)?;
        state
            .groups
            .get(id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(id.to_string()))
    }

    fn list_groups(&self) -> Result<Vec<Group>, BackendError> {
        let state = self.begin(Operation::List)?;
        Ok(state.groups.values().cloned().collect())
    }

    fn delete_group(&self, id: &str) -> Result<(), BackendError> {
        let mut state = self.begin(Operation::Delete)?;
        match state.groups.remove(id) {
            Some(_) => {
                debug!(id, "memory backend: group deleted");
                Ok(())
            }
            None => Err(BackendError::NotFound(id.to_string())),
        }
    }
}
