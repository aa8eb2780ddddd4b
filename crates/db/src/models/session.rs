//! Session model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use trellis_core::entity::{Entity, UpdateTarget};
use trellis_core::types::{EntityId, Timestamp};
use trellis_core::validation::{non_zero, not_blank, valid_uuid};
use validator::Validate;

use crate::query::SqlValue;
use crate::table::Table;

/// A row from the `sessions` table.
///
/// `deleted_at` is ordinary data recorded by clients; it does not hide the
/// row from reads.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Session {
    pub id: EntityId,
    pub title: String,
    pub notes: Option<String>,
    pub duration_minutes: i32,
    pub completed: bool,
    pub started_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new session. `completed` defaults to `false`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSession {
    #[validate(custom(function = "not_blank"))]
    pub title: String,
    pub notes: Option<String>,
    #[validate(custom(function = "non_zero"))]
    pub duration_minutes: i32,
    pub completed: Option<bool>,
    #[validate(required(message = "cannot be blank"))]
    pub started_at: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
}

/// DTO for updating an existing session. Absent fields are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateSession {
    #[validate(custom(function = "valid_uuid"))]
    pub id: String,
    #[validate(custom(function = "not_blank"))]
    pub title: Option<String>,
    pub notes: Option<String>,
    #[validate(custom(function = "non_zero"))]
    pub duration_minutes: Option<i32>,
    pub completed: Option<bool>,
    pub started_at: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
}

impl UpdateTarget for UpdateSession {
    fn target_id(&self) -> &str {
        &self.id
    }
}

impl Entity for Session {
    const NAME: &'static str = "session";
    type Create = CreateSession;
    type Update = UpdateSession;

    fn id(&self) -> EntityId {
        self.id
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }

    fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    fn set_updated_at(&mut self, at: Timestamp) {
        self.updated_at = at;
    }

    fn from_create(id: EntityId, now: Timestamp, input: CreateSession) -> Self {
        Self {
            id,
            title: input.title,
            notes: input.notes,
            duration_minutes: input.duration_minutes,
            completed: input.completed.unwrap_or(false),
            // Validated as present before construction.
            started_at: input.started_at.unwrap_or(now),
            deleted_at: input.deleted_at,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_update(&mut self, patch: UpdateSession) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        if let Some(duration_minutes) = patch.duration_minutes {
            self.duration_minutes = duration_minutes;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(started_at) = patch.started_at {
            self.started_at = started_at;
        }
        if let Some(deleted_at) = patch.deleted_at {
            self.deleted_at = Some(deleted_at);
        }
    }
}

impl Table for Session {
    const TABLE: &'static str = "sessions";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "notes",
        "duration_minutes",
        "completed",
        "started_at",
        "deleted_at",
        "created_at",
        "updated_at",
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["title", "notes"];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.id.into(),
            self.title.clone().into(),
            self.notes.clone().into(),
            self.duration_minutes.into(),
            self.completed.into(),
            self.started_at.into(),
            self.deleted_at.into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }
}
