use crate::types::EntityId;
use crate::validation::ValidationError;

/// Domain error kinds shared by every layer of the pipeline.
///
/// Lower layers classify their failures into one of these variants before
/// returning; upper layers pass them through or map them onto a transport
/// status, never re-deciding the kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(ValidationError),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: EntityId },

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Unexpected behavior: {0}")]
    Unexpected(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: EntityId) -> Self {
        CoreError::NotFound { entity, id }
    }

    pub fn unexpected(cause: impl std::fmt::Display) -> Self {
        CoreError::Unexpected(cause.to_string())
    }
}

/// Convenience alias used by every trait in the pipeline.
pub type CoreResult<T> = Result<T, CoreError>;
