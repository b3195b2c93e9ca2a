pub mod lifecycle;
pub mod notifier;
pub mod scoring;

use crate::repository::StoreError;

/// Domain failures raised by the lifecycle and scoring engines. Every
/// precondition failure is raised before any write happens.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    InvalidState(String),
    /// Kept separate from `InvalidState` so callers can phrase the
    /// "already rescheduled once" case differently for users.
    #[error("{0}")]
    RescheduleLimit(String),
    #[error("{0}")]
    Conflict(String),
    #[error("storage failure")]
    Infrastructure(#[source] anyhow::Error),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict => DomainError::Conflict(
                "application was modified concurrently, retry the operation".to_string(),
            ),
            StoreError::UniqueViolation => DomainError::Conflict(
                "a conflicting record already exists".to_string(),
            ),
            StoreError::Backend(e) => DomainError::Infrastructure(e),
        }
    }
}
