//! PostgreSQL storage for the CRUD pipeline.
//!
//! - [`query`] renders query-spec value objects into parameterized SQL.
//! - [`table`] describes how an entity maps onto its table.
//! - [`repositories::PgRepository`] executes rendered queries for any table.
//! - [`models`] holds the concrete entities and their DTOs.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub mod error;
pub mod models;
pub mod query;
pub mod repositories;
pub mod table;

pub type DbPool = sqlx::PgPool;

/// Default bound on a single storage call.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_millis(1000);

/// Create a connection pool from a database URL.
///
/// Connection acquisition is bounded by `acquire_timeout` so a saturated pool
/// surfaces as an error instead of a hang.
pub async fn create_pool(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
