use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// gRPC services this process serves, reported for readiness probes.
pub const SERVED_SERVICES: [&str; 2] = ["trellis.v1.PlanService", "trellis.v1.SessionService"];

#[derive(Serialize)]
pub struct PoolStats {
    /// Open connections, idle or in use.
    pub size: u32,
    pub idle: usize,
    pub max: u32,
}

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when storage is unreachable.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    pub pool: PoolStats,
    pub services: [&'static str; 2],
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = trellis_db::health_check(&state.pool).await.is_ok();

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        pool: PoolStats {
            size: state.pool.size(),
            idle: state.pool.num_idle(),
            max: state.config.db_max_connections,
        },
        services: SERVED_SERVICES,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
