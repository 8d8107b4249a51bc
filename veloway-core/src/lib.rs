pub mod conversation;
pub mod identity;
pub mod payment;

/// Engine-wide error taxonomy. Every fallible operation in the booking,
/// pricing, trip and settlement services resolves to one of these three
/// categories; validation failures are raised before any mutation.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("validation failed: {0}")]
    Validation(String),
}

impl CoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(why: impl Into<String>) -> Self {
        Self::Conflict(why.into())
    }

    pub fn validation(why: impl Into<String>) -> Self {
        Self::Validation(why.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
