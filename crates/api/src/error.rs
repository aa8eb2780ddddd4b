use tonic::Status;
use trellis_core::error::CoreError;

/// Application-level error type for gRPC handlers.
///
/// Wraps [`CoreError`] for domain errors and converts into a [`Status`]
/// with a consistent code and message per kind.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `trellis_core`.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Convenience type alias for handler results.
pub type AppResult<T> = Result<T, AppError>;

impl From<AppError> for Status {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Core(core) => match core {
                CoreError::Validation(violations) => Status::invalid_argument(violations.to_string()),
                CoreError::NotFound { entity, id } => {
                    Status::not_found(format!("{entity} with id {id} not found"))
                }
                CoreError::PermissionDenied => Status::permission_denied("permission denied"),
                CoreError::Unauthenticated(msg) => Status::unauthenticated(msg),
                CoreError::Unexpected(msg) => {
                    tracing::error!(error = %msg, "Unexpected error");
                    Status::internal("internal error")
                }
            },
        }
    }
}
