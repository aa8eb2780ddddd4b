//! Full-text search and pagination helpers.
//!
//! This module lives in `core` (no storage deps) so both the repository layer
//! and the in-memory repository agree on how search input is interpreted.

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Page size applied when a filter does not set one (or sets zero).
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound on any requested page size.
pub const MAX_PAGE_SIZE: i64 = 1000;

/// Text search configuration passed to `to_tsvector` / `to_tsquery`.
pub const SEARCH_CONFIG: &str = "english";

// ---------------------------------------------------------------------------
// Query builder helpers
// ---------------------------------------------------------------------------

/// Sanitize user input into a list of terms suitable for tsquery construction.
///
/// Every character other than a letter, digit or `_` separates terms, so
/// tsquery operators inside a word (`leg(day`, `a:b`) never reach Postgres.
/// Empty terms are dropped.
///
/// Returns `None` if the input yields no usable terms.
pub fn sanitize_terms(query: &str) -> Option<Vec<&str>> {
    let terms: Vec<&str> = query
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty())
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms)
    }
}

/// Sanitize and convert user input into a PostgreSQL `tsquery` string.
///
/// Whitespace-separated terms are joined with `&` (AND); the last term is
/// prefix-matched so partially typed words still hit.
///
/// # Examples
///
/// ```
/// use trellis_core::search::build_tsquery;
/// assert_eq!(build_tsquery("leg day"), Some("leg & day:*".to_string()));
/// assert_eq!(build_tsquery("  "), None);
/// ```
pub fn build_tsquery(query: &str) -> Option<String> {
    let terms = sanitize_terms(query)?;
    let (last, exact) = terms.split_last()?;
    if exact.is_empty() {
        return Some(format!("{last}:*"));
    }
    Some(format!("{} & {last}:*", exact.join(" & ")))
}

/// Clamp a requested page size to `1..=MAX_PAGE_SIZE`, treating unset or
/// zero as [`DEFAULT_PAGE_SIZE`].
pub fn clamp_page_size(page_size: Option<u32>) -> i64 {
    match page_size {
        None | Some(0) => DEFAULT_PAGE_SIZE,
        Some(n) => i64::from(n).min(MAX_PAGE_SIZE),
    }
}

/// Row offset for a 1-based page number. Page `None`, 0 and 1 start at zero.
pub fn page_offset(page_number: Option<u32>, page_size: i64) -> i64 {
    match page_number {
        Some(n) if n > 1 => (i64::from(n) - 1) * page_size,
        _ => 0,
    }
}
