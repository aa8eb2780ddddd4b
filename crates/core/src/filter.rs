//! List filter shared by every entity.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::search::{build_tsquery, clamp_page_size, page_offset};
use crate::types::EntityId;
use crate::validation::{FieldViolation, ValidationError};

/// Pagination, free-text search, ordering and id allowlist for a list call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub page_size: Option<u32>,
    /// 1-based.
    pub page_number: Option<u32>,
    pub search: Option<String>,
    /// `"column"`, `"column asc"`, `"column desc"` or `"-column"`.
    pub order_by: Vec<String>,
    pub ids: Vec<EntityId>,
}

impl Filter {
    pub fn limit(&self) -> i64 {
        clamp_page_size(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        page_offset(self.page_number, self.limit())
    }

    /// Sanitized tsquery for the search string, if it has any usable terms.
    pub fn tsquery(&self) -> Option<String> {
        self.search.as_deref().and_then(build_tsquery)
    }

    /// Parse every `order_by` expression, reporting all malformed ones at once.
    pub fn order_terms(&self) -> Result<Vec<OrderTerm>, CoreError> {
        let mut terms = Vec::with_capacity(self.order_by.len());
        let mut errors = ValidationError::default();
        for raw in &self.order_by {
            match OrderTerm::parse(raw) {
                Some(term) => terms.push(term),
                None => errors.push(FieldViolation::new(
                    "order_by",
                    "order",
                    format!("invalid order expression: {raw:?}"),
                )),
            }
        }
        if errors.is_empty() {
            Ok(terms)
        } else {
            Err(CoreError::Validation(errors))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One parsed `order_by` entry. The field name is not yet checked against
/// any schema; storage layers resolve it against their own column list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    pub field: String,
    pub direction: Direction,
}

impl OrderTerm {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (field, direction) = if let Some(rest) = raw.strip_prefix('-') {
            (rest.trim(), Direction::Desc)
        } else {
            let mut parts = raw.split_whitespace();
            let field = parts.next()?;
            let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
                None | Some("asc") => Direction::Asc,
                Some("desc") => Direction::Desc,
                Some(_) => return None,
            };
            if parts.next().is_some() {
                return None;
            }
            (field, direction)
        };

        let well_formed = !field.is_empty()
            && field
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        well_formed.then(|| OrderTerm {
            field: field.to_string(),
            direction,
        })
    }
}
