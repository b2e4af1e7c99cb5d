//! Error types for affinity group reconciliation.

use thiserror::Error;

use crate::backend::BackendError;

pub type AffinityResult<T> = Result<T, AffinityError>;

#[derive(Debug, Error)]
pub enum AffinityError {
    /// The backend failed; the pool step was aborted.
    #[error("affinity group backend: {0}")]
    Backend(#[from] BackendError),
}

impl AffinityError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AffinityError::Backend(BackendError::NotFound(_)))
    }
}
