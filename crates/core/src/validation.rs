//! Field-level validation for request DTOs.
//!
//! DTOs derive [`validator::Validate`]; the custom rule functions below give
//! every DTO the same vocabulary ("cannot be blank", "must be a valid UUID").
//! [`check`] runs a DTO's rules and collects every violation into a
//! [`ValidationError`], so callers always see the full set, never just the
//! first failure.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::EntityId;

pub const MSG_BLANK: &str = "cannot be blank";
pub const MSG_INVALID_UUID: &str = "must be a valid UUID";
pub const MSG_INVALID_TIMESTAMP: &str = "must be a valid RFC 3339 timestamp";

/// A single field-level rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Every violation found on one input, ordered by field name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn single(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation::new(field, code, message)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Field names with at least one violation, in order.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self.violations.iter().map(|v| v.field.as_str()).collect();
        fields.dedup();
        fields
    }

    pub fn push(&mut self, violation: FieldViolation) {
        self.violations.push(violation);
        self.sort();
    }

    fn sort(&mut self) {
        self.violations
            .sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .violations
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = ValidationError::default();
        for (field, field_errors) in errors.field_errors() {
            for err in field_errors.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map_or_else(|| err.code.to_string(), ToString::to_string);
                out.violations
                    .push(FieldViolation::new(field.to_string(), err.code.to_string(), message));
            }
        }
        out.sort();
        out
    }
}

/// Run a DTO's validation rules, mapping failures into [`CoreError::Validation`].
pub fn check<T: Validate>(input: &T) -> Result<(), CoreError> {
    input
        .validate()
        .map_err(|errors| CoreError::Validation(errors.into()))
}

/// Parse an identifier field, reporting a validation error against `field`.
pub fn parse_id(field: &str, raw: &str) -> Result<EntityId, CoreError> {
    EntityId::parse_str(raw.trim()).map_err(|_| {
        CoreError::Validation(ValidationError::single(field, "uuid", MSG_INVALID_UUID))
    })
}

fn rule_error(code: &'static str, message: &'static str) -> validator::ValidationError {
    let mut err = validator::ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

// ---------------------------------------------------------------------------
// Custom rules (referenced from `#[validate(custom(function = ...))]`)
// ---------------------------------------------------------------------------

/// Rejects empty and whitespace-only strings.
pub fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(rule_error("blank", MSG_BLANK));
    }
    Ok(())
}

/// Rejects the zero value of an integer field.
pub fn non_zero(value: i32) -> Result<(), validator::ValidationError> {
    if value == 0 {
        return Err(rule_error("blank", MSG_BLANK));
    }
    Ok(())
}

/// Requires a syntactically valid UUID.
pub fn valid_uuid(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(rule_error("blank", MSG_BLANK));
    }
    EntityId::parse_str(value.trim())
        .map(|_| ())
        .map_err(|_| rule_error("uuid", MSG_INVALID_UUID))
}
