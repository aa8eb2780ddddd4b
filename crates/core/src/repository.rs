//! Storage capability consumed by the service layer.

use async_trait::async_trait;

use crate::entity::Entity;
use crate::error::CoreResult;
use crate::filter::Filter;
use crate::types::EntityId;

/// Storage access for one entity type.
///
/// Implementations classify every storage failure into a [`crate::error::CoreError`]
/// kind; callers never see driver errors. `update` and `delete` report
/// `NotFound` when no row was affected.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Persist a fully built record, returning it as stored.
    async fn create(&self, record: &E) -> CoreResult<E>;

    async fn get(&self, id: EntityId) -> CoreResult<E>;

    /// One page of records matching `filter`.
    async fn list(&self, filter: &Filter) -> CoreResult<Vec<E>>;

    /// Number of records matching `filter`, ignoring pagination and ordering.
    async fn count(&self, filter: &Filter) -> CoreResult<i64>;

    /// Overwrite every column of the row keyed by `record.id()`.
    async fn update(&self, record: &E) -> CoreResult<E>;

    async fn delete(&self, id: EntityId) -> CoreResult<()>;
}
