//! How an entity maps onto a relational table.

use sqlx::postgres::PgRow;
use sqlx::FromRow;
use trellis_core::entity::Entity;
use trellis_core::error::{CoreError, CoreResult};
use trellis_core::filter::{Direction, OrderTerm};
use trellis_core::validation::{FieldViolation, ValidationError};

use crate::query::{OrderBy, SqlValue};

/// Primary key column shared by every table.
pub const ID_COLUMN: &str = "id";

/// Creation timestamp column shared by every table; the default sort key.
pub const CREATED_AT_COLUMN: &str = "created_at";

/// A storable entity.
///
/// `COLUMNS` lists every column in select/insert order and must start with
/// [`ID_COLUMN`]. `values` returns one value per column in the same order.
pub trait Table: Entity + for<'r> FromRow<'r, PgRow> + Send + Unpin {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    /// Text columns covered by full-text search. Empty disables search.
    const SEARCH_COLUMNS: &'static [&'static str];

    fn values(&self) -> Vec<SqlValue>;
}

/// Resolve parsed order terms onto the table's own column names.
///
/// Unknown columns are a validation error on `order_by`; the returned column
/// names are always the table's static identifiers, never caller text.
/// No terms means newest first. `id` closes every ordering so pages are
/// stable when earlier keys tie.
pub fn resolve_order<T: Table>(terms: &[OrderTerm]) -> CoreResult<Vec<OrderBy>> {
    let mut order = Vec::with_capacity(terms.len());
    let mut errors = ValidationError::default();
    for term in terms {
        match T::COLUMNS.iter().copied().find(|c| *c == term.field) {
            Some(column) => order.push(OrderBy {
                column,
                direction: term.direction,
            }),
            None => errors.push(FieldViolation::new(
                "order_by",
                "order",
                format!("unknown column for {}: {:?}", T::NAME, term.field),
            )),
        }
    }
    if !errors.is_empty() {
        return Err(CoreError::Validation(errors));
    }
    if order.is_empty() {
        order.push(OrderBy {
            column: CREATED_AT_COLUMN,
            direction: Direction::Desc,
        });
    }
    if !order.iter().any(|o| o.column == ID_COLUMN) {
        order.push(OrderBy {
            column: ID_COLUMN,
            direction: Direction::Desc,
        });
    }
    Ok(order)
}
