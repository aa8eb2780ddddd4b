use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared state available to the HTTP handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: trellis_db::DbPool,
    pub config: Arc<ServerConfig>,
}
