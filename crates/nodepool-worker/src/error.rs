//! Error types for a reconciliation pass.

use thiserror::Error;

use nodepool_affinity::AffinityError;
use nodepool_core::ConfigError;
use nodepool_images::ImageError;
use nodepool_placement::MatchError;
use nodepool_plan::PlanError;
use nodepool_state::StateError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("invalid worker request: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Affinity(#[from] AffinityError),

    #[error("floating pool: {0}")]
    FloatingPool(#[from] MatchError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl WorkerError {
    /// The pass broke one of its own invariants. Retrying with the same
    /// input will fail the same way.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, WorkerError::Plan(_) | WorkerError::Invariant(_))
    }

    /// A required image, floating pool or record does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            WorkerError::Image(ImageError::NotFound { .. }) => true,
            WorkerError::FloatingPool(MatchError::NotFound { .. }) => true,
            WorkerError::State(e) => e.is_not_found(),
            WorkerError::Affinity(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// The group backend failed.
    pub fn is_backend(&self) -> bool {
        matches!(self, WorkerError::Affinity(AffinityError::Backend(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodepool_affinity::BackendError;

    #[test]
    fn categories_are_distinct() {
        let plan: WorkerError = PlanError::MissingImage {
            pool: "workers".to_string(),
        }
        .into();
        assert!(plan.is_invariant_violation());
        assert!(!plan.is_not_found());
        assert!(!plan.is_backend());

        let image: WorkerError = ImageError::NotFound {
            name: "flatcar".to_string(),
            version: "2.0".to_string(),
            region: "eu02".to_string(),
            requested: "architecture amd64".to_string(),
        }
        .into();
        assert!(image.is_not_found());
        assert!(!image.is_invariant_violation());

        let backend: WorkerError =
            AffinityError::from(BackendError::Api("quota exceeded".to_string())).into();
        assert!(backend.is_backend());
        assert!(!backend.is_not_found());
        assert!(!backend.is_invariant_violation());

        let missing: WorkerError = StateError::NotFound("ghost".to_string()).into();
        assert!(missing.is_not_found());
        let corrupt: WorkerError = StateError::Corrupt {
            owner: "ghost".to_string(),
            message: "eof".to_string(),
        }
        .into();
        assert!(!corrupt.is_not_found());

        assert!(WorkerError::Invariant("x".to_string()).is_invariant_violation());
    }
}
