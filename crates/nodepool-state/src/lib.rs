//! nodepool-state: persisted worker status for nodepool.
//!
//! The orchestrator owns persistence; this crate defines what is
//! persisted and how it is rebuilt at the start of a pass:
//!
//! - **`types`**: `WorkerStatus`, `MachineImage`, `AffinityGroupDependency`
//! - **`dependency_set`**: keyed in-memory set of affinity group records
//! - **`store`**: redb-backed `StatusStore`, keyed by owner id
//!
//! Values are JSON-serialized into redb's `&[u8]` value columns, the
//! same encoding the orchestrator uses for the status subresource.

pub mod dependency_set;
pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use dependency_set::DependencySet;
pub use error::{StateError, StateResult};
pub use store::StatusStore;
pub use types::*;
