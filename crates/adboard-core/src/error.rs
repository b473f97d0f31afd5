//! Domain-level error types.

use thiserror::Error;
use uuid::Uuid;

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: Uuid },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Too many open advertisements: at most {limit} may be open at once")]
    OpenQuotaExceeded { limit: u64 },

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Only the creator may modify this advertisement")]
    NotOwner,

    /// The authenticated account was deleted after its token was issued.
    #[error("The requesting account no longer exists")]
    UnknownAccount,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Referenced entity does not exist: {0}")]
    MissingReference(String),
}

impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Constraint(msg) => DomainError::Duplicate(msg),
            // The only reference a write carries is the creator.
            RepoError::MissingReference(_) => DomainError::UnknownAccount,
            other => DomainError::Internal(other.to_string()),
        }
    }
}
