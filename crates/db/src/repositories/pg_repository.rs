//! Generic repository over any [`Table`].

use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use trellis_core::error::{CoreError, CoreResult};
use trellis_core::filter::Filter;
use trellis_core::repository::Repository;
use trellis_core::types::EntityId;

use crate::error::{classify_sqlx_error, timed_out};
use crate::query::{render, QuerySpec, RenderedQuery, SqlValue};
use crate::table::Table;
use crate::DEFAULT_QUERY_TIMEOUT;

/// Bind every rendered parameter onto a sqlx query builder, in order.
macro_rules! bind_all {
    ($query:expr, $params:expr) => {{
        let mut query = $query;
        for value in $params {
            query = match value {
                SqlValue::Uuid(v) => query.bind(v),
                SqlValue::UuidArray(v) => query.bind(v),
                SqlValue::Text(v) => query.bind(v),
                SqlValue::Int(v) => query.bind(v),
                SqlValue::BigInt(v) => query.bind(v),
                SqlValue::Bool(v) => query.bind(v),
                SqlValue::Timestamp(v) => query.bind(v),
            };
        }
        query
    }};
}

/// Executes rendered [`QuerySpec`]s for one entity table.
///
/// Every call is bounded by the configured timeout; a call that outlives it
/// fails with `Unexpected`.
pub struct PgRepository<E> {
    pool: PgPool,
    timeout: Duration,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Table> PgRepository<E> {
    pub fn new(pool: PgPool) -> Self {
        Self::with_timeout(pool, DEFAULT_QUERY_TIMEOUT)
    }

    pub fn with_timeout(pool: PgPool, timeout: Duration) -> Self {
        Self {
            pool,
            timeout,
            _entity: PhantomData,
        }
    }

    async fn bounded<T, F>(&self, op: &'static str, id: Option<EntityId>, fut: F) -> CoreResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(classify_sqlx_error(E::NAME, op, id, err)),
            Err(_) => Err(timed_out(E::NAME, op)),
        }
    }

    async fn fetch_optional(
        &self,
        op: &'static str,
        id: EntityId,
        spec: QuerySpec,
    ) -> CoreResult<Option<E>> {
        let RenderedQuery { sql, params } = render(&spec);
        tracing::debug!(entity = E::NAME, op, %sql, "Executing query");
        let query = bind_all!(sqlx::query_as::<Postgres, E>(&sql), params);
        self.bounded(op, Some(id), query.fetch_optional(&self.pool))
            .await
    }
}

impl<E> Clone for PgRepository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            timeout: self.timeout,
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<E: Table> Repository<E> for PgRepository<E> {
    async fn create(&self, record: &E) -> CoreResult<E> {
        let RenderedQuery { sql, params } = render(&QuerySpec::insert(record));
        tracing::debug!(entity = E::NAME, %sql, "Executing query");
        let query = bind_all!(sqlx::query_as::<Postgres, E>(&sql), params);
        self.bounded("create", Some(record.id()), query.fetch_one(&self.pool))
            .await
    }

    async fn get(&self, id: EntityId) -> CoreResult<E> {
        self.fetch_optional("get", id, QuerySpec::find::<E>(id))
            .await?
            .ok_or_else(|| CoreError::not_found(E::NAME, id))
    }

    async fn list(&self, filter: &Filter) -> CoreResult<Vec<E>> {
        let RenderedQuery { sql, params } = render(&QuerySpec::select::<E>(filter)?);
        tracing::debug!(entity = E::NAME, %sql, "Executing query");
        let query = bind_all!(sqlx::query_as::<Postgres, E>(&sql), params);
        self.bounded("list", None, query.fetch_all(&self.pool)).await
    }

    async fn count(&self, filter: &Filter) -> CoreResult<i64> {
        let RenderedQuery { sql, params } = render(&QuerySpec::count::<E>(filter));
        tracing::debug!(entity = E::NAME, %sql, "Executing query");
        let query = bind_all!(sqlx::query_scalar::<Postgres, i64>(&sql), params);
        self.bounded("count", None, query.fetch_one(&self.pool)).await
    }

    async fn update(&self, record: &E) -> CoreResult<E> {
        let id = record.id();
        self.fetch_optional("update", id, QuerySpec::update(record))
            .await?
            .ok_or_else(|| CoreError::not_found(E::NAME, id))
    }

    async fn delete(&self, id: EntityId) -> CoreResult<()> {
        let RenderedQuery { sql, params } = render(&QuerySpec::delete::<E>(id));
        tracing::debug!(entity = E::NAME, %sql, "Executing query");
        let query = bind_all!(sqlx::query::<Postgres>(&sql), params);
        let result = self
            .bounded("delete", Some(id), query.execute(&self.pool))
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::not_found(E::NAME, id));
        }
        Ok(())
    }
}
