//! nodepool-affinity: lifecycle of per-pool affinity groups.
//!
//! A pool that requests an affinity policy gets one backend group named
//! `{owner}-{pool}-{hash(policy)}`. The reconciler keeps the backend and
//! the caller's [`DependencySet`](nodepool_state::DependencySet) in step:
//!
//! - **`backend`**: the `GroupBackend` trait and the in-process `MemoryBackend`
//! - **`naming`**: deterministic group names and ownership parsing for the sweep
//! - **`reconciler`**: per-pool state machine, orphan sweep, cleanup

pub mod backend;
pub mod error;
pub mod naming;
pub mod reconciler;

pub use backend::{BackendError, CallCounts, Group, GroupBackend, MemoryBackend, MemorySnapshot, Operation};
pub use error::{AffinityError, AffinityResult};
pub use naming::{group_name, owned_pool};
pub use reconciler::AffinityReconciler;
