//! In-process [`Repository`] for tests and local runs without Postgres.
//!
//! Records are kept in insertion order. Filtering mirrors the relational
//! repository: the id allowlist and search predicates are shared by `list`
//! and `count`, while ordering and pagination apply to `list` only. Search is
//! a case-insensitive match of every sanitized term against the record's
//! string fields; ordering compares the JSON form of the named field, and a
//! field absent from the stored records' JSON is rejected like an unknown
//! column. Without explicit terms the insertion order is kept.

use std::cmp::Ordering;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use crate::filter::{Direction, Filter, OrderTerm};
use crate::repository::Repository;
use crate::search::sanitize_terms;
use crate::types::EntityId;
use crate::validation::{FieldViolation, ValidationError};

pub struct MemoryRepository<E> {
    rows: Mutex<Vec<E>>,
}

impl<E: Entity> Default for MemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> MemoryRepository<E> {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
        }
    }

    /// Seed the repository with existing records.
    pub fn with_records(records: impl IntoIterator<Item = E>) -> Self {
        Self {
            rows: Mutex::new(records.into_iter().collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<E>> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_order_fields(&self, order: &[OrderTerm]) -> CoreResult<()> {
        let Some(sample) = self.lock().first().map(serde_json::to_value) else {
            return Ok(());
        };
        let sample = sample.map_err(CoreError::unexpected)?;
        let mut errors = ValidationError::default();
        for term in order.iter().filter(|t| sample.get(&t.field).is_none()) {
            errors.push(FieldViolation::new(
                "order_by",
                "order",
                format!("unknown column for {}: {:?}", E::NAME, term.field),
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(errors))
        }
    }

    /// Records matching the filter's predicates, before ordering/pagination.
    fn matching(&self, filter: &Filter) -> Vec<E> {
        let terms: Vec<String> = filter
            .search
            .as_deref()
            .and_then(sanitize_terms)
            .map(|terms| terms.iter().map(|t| t.to_lowercase()).collect())
            .unwrap_or_default();

        self.lock()
            .iter()
            .filter(|r| filter.ids.is_empty() || filter.ids.contains(&r.id()))
            .filter(|r| terms.is_empty() || matches_terms(*r, &terms))
            .cloned()
            .collect()
    }
}

fn matches_terms<E: Entity>(record: &E, terms: &[String]) -> bool {
    let haystack = match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map
            .values()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase(),
        _ => return false,
    };
    terms.iter().all(|t| haystack.contains(t.as_str()))
}

fn compare_json(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn sort_records<E: Entity>(records: &mut [E], order: &[OrderTerm]) {
    if order.is_empty() {
        return;
    }
    let mut keyed: Vec<(Value, usize)> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (serde_json::to_value(r).unwrap_or(Value::Null), i))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| {
        order
            .iter()
            .map(|term| {
                let ord = compare_json(
                    a.get(&term.field).unwrap_or(&Value::Null),
                    b.get(&term.field).unwrap_or(&Value::Null),
                );
                match term.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
    let sorted: Vec<E> = keyed.iter().map(|(_, i)| records[*i].clone()).collect();
    records.clone_from_slice(&sorted);
}

#[async_trait]
impl<E: Entity> Repository<E> for MemoryRepository<E> {
    async fn create(&self, record: &E) -> CoreResult<E> {
        let mut rows = self.lock();
        if rows.iter().any(|r| r.id() == record.id()) {
            return Err(CoreError::Unexpected(format!(
                "duplicate key: {} {} already exists",
                E::NAME,
                record.id()
            )));
        }
        rows.push(record.clone());
        Ok(record.clone())
    }

    async fn get(&self, id: EntityId) -> CoreResult<E> {
        self.lock()
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(E::NAME, id))
    }

    async fn list(&self, filter: &Filter) -> CoreResult<Vec<E>> {
        let order = filter.order_terms()?;
        self.check_order_fields(&order)?;
        let mut records = self.matching(filter);
        sort_records(&mut records, &order);

        let offset = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(filter.limit()).unwrap_or(usize::MAX);
        Ok(records.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, filter: &Filter) -> CoreResult<i64> {
        i64::try_from(self.matching(filter).len()).map_err(CoreError::unexpected)
    }

    async fn update(&self, record: &E) -> CoreResult<E> {
        let mut rows = self.lock();
        let slot = rows
            .iter_mut()
            .find(|r| r.id() == record.id())
            .ok_or_else(|| CoreError::not_found(E::NAME, record.id()))?;
        *slot = record.clone();
        Ok(record.clone())
    }

    async fn delete(&self, id: EntityId) -> CoreResult<()> {
        let mut rows = self.lock();
        let before = rows.len();
        rows.retain(|r| r.id() != id);
        if rows.len() == before {
            return Err(CoreError::not_found(E::NAME, id));
        }
        Ok(())
    }
}
