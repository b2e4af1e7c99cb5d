//! nodepool-worker: the worker delegate.
//!
//! Runs one reconciliation pass for an owner: affinity groups, image
//! resolution, floating pool selection and the deployment plan. The
//! returned status always reflects the work completed, so the caller can
//! persist it even when the pass fails.

pub mod delegate;
pub mod error;

pub use delegate::{PassOutcome, WorkerDelegate, WorkerPlan};
pub use error::{WorkerError, WorkerResult};
