//! Error types for plan generation.

use thiserror::Error;

pub type PlanResult<T> = Result<T, PlanError>;

/// Both variants mean an earlier stage of the pass did not do its job;
/// neither is fixed by retrying the plan alone.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("pool {pool} requests affinity policy {policy:?} but has no affinity group")]
    MissingAffinityGroup { pool: String, policy: String },

    #[error("pool {pool} has no resolved machine image")]
    MissingImage { pool: String },
}
