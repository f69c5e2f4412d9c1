use thiserror::Error;

/// Failure returned by the use-case/validation layer.
///
/// All validation functions return these as values, never panic. The three
/// variants are the whole taxonomy: malformed input or an invalid state
/// transition, an authorization failure, or a missing referenced entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UseCaseError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),
}

impl UseCaseError {
    pub fn validation(message: impl Into<String>) -> Self {
        UseCaseError::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        UseCaseError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        UseCaseError::NotFound(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, UseCaseError::Validation(_))
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, UseCaseError::Forbidden(_))
    }
}

/// Errors from port operations (persistence, feedback, lookup).
///
/// Raised by executor-side adapters; the controller normalizes these into
/// [`UseCaseError`] before storing them as the session's current error, so
/// I/O failures never propagate past the orchestrator boundary.
#[derive(Debug, Error)]
pub enum PortError {
    #[error("backing store unavailable")]
    Unavailable,

    #[error("i/o error: {0}")]
    Io(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<PortError> for UseCaseError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound => UseCaseError::not_found("The requested entity was not found."),
            PortError::Conflict(detail) => UseCaseError::validation(detail),
            PortError::Unavailable | PortError::Io(_) => {
                UseCaseError::validation("The operation could not be completed. Please retry.")
            }
        }
    }
}

/// Errors from the streaming generation port.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Request(String),

    #[error("generation stream interrupted: {0}")]
    Interrupted(String),

    #[error("generation cancelled")]
    Cancelled,
}
