//! Classification of storage failures into domain error kinds.

use trellis_core::error::CoreError;
use trellis_core::types::EntityId;

/// PostgreSQL unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL foreign key violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Map a sqlx error raised while running `op` on `entity` into a [`CoreError`].
///
/// - `RowNotFound` with a known id becomes `NotFound`.
/// - Everything else is `Unexpected`, with constraint violations named so
///   the log line is actionable.
pub fn classify_sqlx_error(
    entity: &'static str,
    op: &'static str,
    id: Option<EntityId>,
    err: sqlx::Error,
) -> CoreError {
    match (&err, id) {
        (sqlx::Error::RowNotFound, Some(id)) => CoreError::not_found(entity, id),
        (sqlx::Error::Database(db_err), _) => {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let detail = match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    format!("{entity} {op}: duplicate value violates {constraint}")
                }
                Some(FOREIGN_KEY_VIOLATION) => {
                    format!("{entity} {op}: reference violates {constraint}")
                }
                _ => format!("{entity} {op}: {db_err}"),
            };
            tracing::error!(error = %db_err, entity, op, "Database error");
            CoreError::Unexpected(detail)
        }
        _ => {
            tracing::error!(error = %err, entity, op, "Database error");
            CoreError::Unexpected(format!("{entity} {op}: {err}"))
        }
    }
}

/// The error for a storage call that outlived its deadline.
pub fn timed_out(entity: &'static str, op: &'static str) -> CoreError {
    tracing::error!(entity, op, "Storage call timed out");
    CoreError::Unexpected(format!("{entity} {op}: storage call timed out"))
}
