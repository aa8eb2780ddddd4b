//! Business use-case layer: validation, stamping, partial-update merge.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;

use crate::clock::{Clock, IdGenerator};
use crate::entity::{Entity, UpdateTarget};
use crate::error::CoreResult;
use crate::filter::Filter;
use crate::repository::Repository;
use crate::types::EntityId;
use crate::validation::{check, parse_id};

/// One page of a list call together with the unpaginated total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<E> {
    pub items: Vec<E>,
    pub total: i64,
}

#[async_trait]
pub trait Service<E: Entity>: Send + Sync {
    async fn create(&self, input: E::Create) -> CoreResult<E>;
    async fn get(&self, id: EntityId) -> CoreResult<E>;
    async fn list(&self, filter: &Filter) -> CoreResult<Page<E>>;
    async fn update(&self, input: E::Update) -> CoreResult<E>;
    async fn delete(&self, id: EntityId) -> CoreResult<()>;
}

/// The generic [`Service`] implementation shared by every entity.
pub struct CrudService<E, R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    _entity: PhantomData<fn() -> E>,
}

impl<E, R> CrudService<E, R>
where
    E: Entity,
    R: Repository<E>,
{
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            repo,
            clock,
            ids,
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<E, R> Service<E> for CrudService<E, R>
where
    E: Entity,
    R: Repository<E> + 'static,
{
    #[instrument(skip_all, fields(entity = E::NAME))]
    async fn create(&self, input: E::Create) -> CoreResult<E> {
        check(&input)?;

        let id = self.ids.new_id();
        let record = E::from_create(id, self.clock.now(), input);
        let created = self.repo.create(&record).await?;

        tracing::info!(id = %created.id(), "Created record");
        Ok(created)
    }

    #[instrument(skip_all, fields(entity = E::NAME, id = %id))]
    async fn get(&self, id: EntityId) -> CoreResult<E> {
        self.repo.get(id).await
    }

    #[instrument(skip_all, fields(entity = E::NAME))]
    async fn list(&self, filter: &Filter) -> CoreResult<Page<E>> {
        let items = self.repo.list(filter).await?;
        let total = self.repo.count(filter).await?;

        tracing::debug!(returned = items.len(), total, "Listed records");
        Ok(Page { items, total })
    }

    #[instrument(skip_all, fields(entity = E::NAME))]
    async fn update(&self, input: E::Update) -> CoreResult<E> {
        check(&input)?;
        let id = parse_id("id", input.target_id())?;

        let mut record = self.repo.get(id).await?;
        record.apply_update(input);
        record.touch(self.clock.now());

        let updated = self.repo.update(&record).await?;
        tracing::info!(id = %id, "Updated record");
        Ok(updated)
    }

    #[instrument(skip_all, fields(entity = E::NAME, id = %id))]
    async fn delete(&self, id: EntityId) -> CoreResult<()> {
        self.repo.delete(id).await?;
        tracing::info!("Deleted record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::clock::{FixedClock, FixedIdGenerator};
    use crate::error::CoreError;
    use crate::fixtures::{CreateWidget, UpdateWidget, Widget};
    use crate::memory::MemoryRepository;

    fn t0() -> crate::types::Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn widget_id() -> EntityId {
        EntityId::parse_str("0190a5f4-0000-7000-8000-000000000001").unwrap()
    }

    fn service(
        repo: Arc<MemoryRepository<Widget>>,
        clock: Arc<FixedClock>,
    ) -> CrudService<Widget, MemoryRepository<Widget>> {
        CrudService::new(repo, clock, Arc::new(FixedIdGenerator(widget_id())))
    }

    fn new_widget() -> CreateWidget {
        CreateWidget {
            name: "Sprocket".into(),
            quantity: 4,
            color: Some("red".into()),
        }
    }

    #[tokio::test]
    async fn create_stamps_id_and_timestamps() {
        let repo = Arc::new(MemoryRepository::new());
        let svc = service(repo.clone(), Arc::new(FixedClock::new(t0())));

        let widget = svc.create(new_widget()).await.unwrap();

        assert_eq!(widget.id, widget_id());
        assert_eq!(widget.created_at, t0());
        assert_eq!(widget.updated_at, t0());
        assert_eq!(widget.name, "Sprocket");
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn create_rejects_invalid_input_before_storage() {
        let repo = Arc::new(MemoryRepository::new());
        let svc = service(repo.clone(), Arc::new(FixedClock::new(t0())));

        let err = svc
            .create(CreateWidget {
                name: String::new(),
                quantity: 0,
                color: None,
            })
            .await
            .unwrap_err();

        assert_matches!(err, CoreError::Validation(v) if v.fields() == vec!["name", "quantity"]);
        assert_eq!(repo.len(), 0);
    }

    #[tokio::test]
    async fn update_only_overwrites_present_fields() {
        let repo = Arc::new(MemoryRepository::new());
        let clock = Arc::new(FixedClock::new(t0()));
        let svc = service(repo, clock.clone());
        let original = svc.create(new_widget()).await.unwrap();

        let later = t0() + Duration::minutes(5);
        clock.set(later);
        let updated = svc
            .update(UpdateWidget {
                id: original.id.to_string(),
                name: None,
                quantity: Some(9),
                color: None,
            })
            .await
            .unwrap();

        let mut expected = original.clone();
        expected.quantity = 9;
        expected.updated_at = later;
        assert_eq!(updated, expected);
    }

    #[tokio::test]
    async fn update_never_moves_updated_at_before_created_at() {
        let repo = Arc::new(MemoryRepository::new());
        let clock = Arc::new(FixedClock::new(t0()));
        let svc = service(repo, clock.clone());
        let original = svc.create(new_widget()).await.unwrap();

        clock.set(t0() - Duration::hours(1));
        let updated = svc
            .update(UpdateWidget {
                id: original.id.to_string(),
                name: Some("Gear".into()),
                quantity: None,
                color: None,
            })
            .await
            .unwrap();

        assert_eq!(updated.updated_at, original.created_at);
    }

    #[tokio::test]
    async fn update_of_missing_record_is_not_found() {
        let svc = service(Arc::new(MemoryRepository::new()), Arc::new(FixedClock::new(t0())));
        let missing = EntityId::new_v4();

        let err = svc
            .update(UpdateWidget {
                id: missing.to_string(),
                name: Some("x".into()),
                quantity: None,
                color: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err, CoreError::not_found("widget", missing));
    }

    #[tokio::test]
    async fn update_with_malformed_id_is_validation_error() {
        let svc = service(Arc::new(MemoryRepository::new()), Arc::new(FixedClock::new(t0())));

        let err = svc
            .update(UpdateWidget {
                id: "not-a-uuid".into(),
                name: Some(String::new()),
                quantity: None,
                color: None,
            })
            .await
            .unwrap_err();

        assert_matches!(err, CoreError::Validation(v) if v.fields() == vec!["id", "name"]);
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let svc = service(Arc::new(MemoryRepository::new()), Arc::new(FixedClock::new(t0())));
        let id = EntityId::new_v4();
        assert_eq!(svc.delete(id).await.unwrap_err(), CoreError::not_found("widget", id));
    }

    /// Repository whose `count` always fails, to prove `list` is all-or-nothing.
    struct FailingCount {
        inner: MemoryRepository<Widget>,
        list_calls: AtomicUsize,
    }

    #[async_trait]
    impl Repository<Widget> for FailingCount {
        async fn create(&self, record: &Widget) -> CoreResult<Widget> {
            self.inner.create(record).await
        }
        async fn get(&self, id: EntityId) -> CoreResult<Widget> {
            self.inner.get(id).await
        }
        async fn list(&self, filter: &Filter) -> CoreResult<Vec<Widget>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.list(filter).await
        }
        async fn count(&self, _filter: &Filter) -> CoreResult<i64> {
            Err(CoreError::Unexpected("connection reset".into()))
        }
        async fn update(&self, record: &Widget) -> CoreResult<Widget> {
            self.inner.update(record).await
        }
        async fn delete(&self, id: EntityId) -> CoreResult<()> {
            self.inner.delete(id).await
        }
    }

    #[tokio::test]
    async fn list_fails_when_count_fails() {
        let repo = Arc::new(FailingCount {
            inner: MemoryRepository::new(),
            list_calls: AtomicUsize::new(0),
        });
        let svc: CrudService<Widget, FailingCount> = CrudService::new(
            repo.clone(),
            Arc::new(FixedClock::new(t0())),
            Arc::new(FixedIdGenerator(widget_id())),
        );

        let err = svc.list(&Filter::default()).await.unwrap_err();

        assert_eq!(err, CoreError::Unexpected("connection reset".into()));
        assert_eq!(repo.list_calls.load(Ordering::SeqCst), 1);
    }

    /// Repository that loses the row between the read and the write.
    struct VanishingRow {
        inner: MemoryRepository<Widget>,
    }

    #[async_trait]
    impl Repository<Widget> for VanishingRow {
        async fn create(&self, record: &Widget) -> CoreResult<Widget> {
            self.inner.create(record).await
        }
        async fn get(&self, id: EntityId) -> CoreResult<Widget> {
            let found = self.inner.get(id).await?;
            self.inner.delete(id).await?;
            Ok(found)
        }
        async fn list(&self, filter: &Filter) -> CoreResult<Vec<Widget>> {
            self.inner.list(filter).await
        }
        async fn count(&self, filter: &Filter) -> CoreResult<i64> {
            self.inner.count(filter).await
        }
        async fn update(&self, record: &Widget) -> CoreResult<Widget> {
            self.inner.update(record).await
        }
        async fn delete(&self, id: EntityId) -> CoreResult<()> {
            self.inner.delete(id).await
        }
    }

    #[tokio::test]
    async fn update_of_vanished_row_is_not_found() {
        let repo = Arc::new(VanishingRow {
            inner: MemoryRepository::new(),
        });
        let svc: CrudService<Widget, VanishingRow> = CrudService::new(
            repo,
            Arc::new(FixedClock::new(t0())),
            Arc::new(FixedIdGenerator(widget_id())),
        );
        let created = svc.create(new_widget()).await.unwrap();

        let err = svc
            .update(UpdateWidget {
                id: created.id.to_string(),
                name: Some("Gear".into()),
                quantity: None,
                color: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err, CoreError::not_found("widget", created.id));
    }
}
