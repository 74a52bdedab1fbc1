//! Error types shared by the stores, the tracker and the API.

use crate::db::DbLockError;

/// Failure talking to a progress, session or profile store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Transient infrastructure failure; the operation had no effect locally
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    /// A specific entity that was required does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

impl StoreError {
    /// Returns a user-facing error message without exposing store internals.
    pub fn user_message(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "Progress could not be saved right now, please retry",
            StoreError::NotFound(_) => "Not found",
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl From<DbLockError> for StoreError {
    fn from(e: DbLockError) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Unavailable(format!("corrupt stored value: {}", e))
    }
}

/// Failure of a study operation exposed to the presentation layer.
#[derive(Debug, thiserror::Error)]
pub enum StudyError {
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The learner has no session open
    #[error("No active study session")]
    NoActiveSession,
}

impl StudyError {
    pub fn user_message(&self) -> &'static str {
        match self {
            StudyError::Store(e) => e.user_message(),
            StudyError::NoActiveSession => "No active study session",
        }
    }
}
