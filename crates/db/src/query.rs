//! Query specifications and their SQL rendering.
//!
//! A [`QuerySpec`] is plain data: statement kind, table, column list,
//! predicates, ordering, pagination and row values. [`render`] is the only
//! place SQL text is produced. Identifiers in the output always come from a
//! table's static column list; everything caller-supplied travels as a bind
//! parameter.

use trellis_core::error::CoreResult;
use trellis_core::filter::{Direction, Filter};
use trellis_core::search::SEARCH_CONFIG;
use trellis_core::types::{EntityId, Timestamp};

use crate::table::{resolve_order, Table, ID_COLUMN};

/// A bind parameter. Nullable variants keep their SQL type so `NULL`s bind
/// with the right parameter type.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Uuid(Option<EntityId>),
    UuidArray(Vec<EntityId>),
    Text(Option<String>),
    Int(Option<i32>),
    BigInt(Option<i64>),
    Bool(Option<bool>),
    Timestamp(Option<Timestamp>),
}

impl From<EntityId> for SqlValue {
    fn from(v: EntityId) -> Self {
        SqlValue::Uuid(Some(v))
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(Some(v))
    }
}

impl From<Option<String>> for SqlValue {
    fn from(v: Option<String>) -> Self {
        SqlValue::Text(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(Some(v))
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::BigInt(Some(v))
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(Some(v))
    }
}

impl From<Timestamp> for SqlValue {
    fn from(v: Timestamp) -> Self {
        SqlValue::Timestamp(Some(v))
    }
}

impl From<Option<Timestamp>> for SqlValue {
    fn from(v: Option<Timestamp>) -> Self {
        SqlValue::Timestamp(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statement {
    Select,
    Count,
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    IdEq(EntityId),
    IdIn(Vec<EntityId>),
    /// Full-text match of a sanitized tsquery against the given columns.
    TextSearch {
        columns: &'static [&'static str],
        tsquery: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub statement: Statement,
    pub table: &'static str,
    pub columns: &'static [&'static str],
    pub predicates: Vec<Predicate>,
    pub order: Vec<OrderBy>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Row values for insert/update, in `columns` order.
    pub values: Vec<SqlValue>,
}

/// SQL text plus its positional parameters (`$1`, `$2`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// The WHERE predicates a filter implies. Shared by `select` and `count` so
/// both always see the same row set.
pub fn filter_predicates<T: Table>(filter: &Filter) -> Vec<Predicate> {
    let mut predicates = Vec::new();
    if !filter.ids.is_empty() {
        predicates.push(Predicate::IdIn(filter.ids.clone()));
    }
    if let Some(tsquery) = filter.tsquery() {
        if !T::SEARCH_COLUMNS.is_empty() {
            predicates.push(Predicate::TextSearch {
                columns: T::SEARCH_COLUMNS,
                tsquery,
            });
        }
    }
    predicates
}

impl QuerySpec {
    fn base<T: Table>(statement: Statement) -> Self {
        Self {
            statement,
            table: T::TABLE,
            columns: T::COLUMNS,
            predicates: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            values: Vec::new(),
        }
    }

    /// One page of rows matching `filter`.
    pub fn select<T: Table>(filter: &Filter) -> CoreResult<Self> {
        let order = resolve_order::<T>(&filter.order_terms()?)?;
        let offset = filter.offset();
        Ok(Self {
            predicates: filter_predicates::<T>(filter),
            order,
            limit: Some(filter.limit()),
            offset: (offset > 0).then_some(offset),
            ..Self::base::<T>(Statement::Select)
        })
    }

    /// Number of rows matching `filter`; never paginated or ordered.
    pub fn count<T: Table>(filter: &Filter) -> Self {
        Self {
            predicates: filter_predicates::<T>(filter),
            ..Self::base::<T>(Statement::Count)
        }
    }

    pub fn find<T: Table>(id: EntityId) -> Self {
        Self {
            predicates: vec![Predicate::IdEq(id)],
            ..Self::base::<T>(Statement::Select)
        }
    }

    pub fn insert<T: Table>(record: &T) -> Self {
        Self {
            values: record.values(),
            ..Self::base::<T>(Statement::Insert)
        }
    }

    /// Overwrite every non-id column of the row keyed by `record`'s id.
    pub fn update<T: Table>(record: &T) -> Self {
        Self {
            predicates: vec![Predicate::IdEq(record.id())],
            values: record.values(),
            ..Self::base::<T>(Statement::Update)
        }
    }

    pub fn delete<T: Table>(id: EntityId) -> Self {
        Self {
            predicates: vec![Predicate::IdEq(id)],
            ..Self::base::<T>(Statement::Delete)
        }
    }
}

/// Accumulates parameters and hands out their placeholders.
struct Params(Vec<SqlValue>);

impl Params {
    fn push(&mut self, value: SqlValue) -> String {
        self.0.push(value);
        format!("${}", self.0.len())
    }
}

fn render_predicate(predicate: &Predicate, params: &mut Params) -> String {
    match predicate {
        Predicate::IdEq(id) => format!("{ID_COLUMN} = {}", params.push((*id).into())),
        Predicate::IdIn(ids) => format!(
            "{ID_COLUMN} = ANY({})",
            params.push(SqlValue::UuidArray(ids.clone()))
        ),
        Predicate::TextSearch { columns, tsquery } => format!(
            "{} @@ to_tsquery('{SEARCH_CONFIG}', {})",
            search_vector(columns),
            params.push(SqlValue::Text(Some(tsquery.clone())))
        ),
    }
}

/// The indexed tsvector expression over `columns`. Migrations create their
/// GIN indexes on exactly this text.
pub fn search_vector(columns: &[&str]) -> String {
    let parts: Vec<String> = columns
        .iter()
        .map(|c| format!("coalesce({c}, '')"))
        .collect();
    format!("to_tsvector('{SEARCH_CONFIG}', {})", parts.join(" || ' ' || "))
}

fn where_clause(predicates: &[Predicate], params: &mut Params) -> String {
    if predicates.is_empty() {
        return String::new();
    }
    let rendered: Vec<String> = predicates
        .iter()
        .map(|p| render_predicate(p, params))
        .collect();
    format!(" WHERE {}", rendered.join(" AND "))
}

/// Render a spec into SQL text and positional parameters.
pub fn render(spec: &QuerySpec) -> RenderedQuery {
    let mut params = Params(Vec::new());
    let columns = spec.columns.join(", ");
    let table = spec.table;

    let sql = match spec.statement {
        Statement::Select => {
            let mut sql = format!("SELECT {columns} FROM {table}");
            sql.push_str(&where_clause(&spec.predicates, &mut params));
            if !spec.order.is_empty() {
                let order: Vec<String> = spec
                    .order
                    .iter()
                    .map(|o| format!("{} {}", o.column, o.direction.as_sql()))
                    .collect();
                sql.push_str(&format!(" ORDER BY {}", order.join(", ")));
            }
            if let Some(limit) = spec.limit {
                sql.push_str(&format!(" LIMIT {}", params.push(limit.into())));
            }
            if let Some(offset) = spec.offset {
                sql.push_str(&format!(" OFFSET {}", params.push(offset.into())));
            }
            sql
        }
        Statement::Count => {
            let mut sql = format!("SELECT COUNT(*) FROM {table}");
            sql.push_str(&where_clause(&spec.predicates, &mut params));
            sql
        }
        Statement::Insert => {
            let placeholders: Vec<String> =
                spec.values.iter().map(|v| params.push(v.clone())).collect();
            format!(
                "INSERT INTO {table} ({columns}) VALUES ({}) RETURNING {columns}",
                placeholders.join(", ")
            )
        }
        Statement::Update => {
            let assignments: Vec<String> = spec
                .columns
                .iter()
                .zip(&spec.values)
                .filter(|(column, _)| **column != ID_COLUMN)
                .map(|(column, value)| format!("{column} = {}", params.push(value.clone())))
                .collect();
            let mut sql = format!("UPDATE {table} SET {}", assignments.join(", "));
            sql.push_str(&where_clause(&spec.predicates, &mut params));
            sql.push_str(&format!(" RETURNING {columns}"));
            sql
        }
        Statement::Delete => {
            let mut sql = format!("DELETE FROM {table}");
            sql.push_str(&where_clause(&spec.predicates, &mut params));
            sql
        }
    };

    RenderedQuery {
        sql,
        params: params.0,
    }
}
