//! Status store errors.

use thiserror::Error;

pub type StateResult<T> = Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("cannot open status store: {0}")]
    Open(String),

    /// Transaction, table or row access failed inside redb.
    #[error("status store: {0}")]
    Storage(String),

    #[error("cannot encode status for owner {owner}: {message}")]
    Encode { owner: String, message: String },

    /// The stored bytes no longer decode as a `WorkerStatus`.
    #[error("stored status for owner {owner} is unreadable: {message}")]
    Corrupt { owner: String, message: String },

    #[error("no status stored for owner {0}")]
    NotFound(String),
}

impl StateError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StateError::NotFound(_))
    }
}
