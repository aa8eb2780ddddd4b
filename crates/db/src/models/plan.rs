//! Plan model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use trellis_core::entity::{Entity, UpdateTarget};
use trellis_core::types::{EntityId, Timestamp};
use trellis_core::validation::{non_zero, not_blank, valid_uuid};
use validator::Validate;

use crate::query::SqlValue;
use crate::table::Table;

/// A row from the `plans` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Plan {
    pub id: EntityId,
    pub name: String,
    pub repeat: i32,
    pub equipment_id: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new plan.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePlan {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(custom(function = "non_zero"))]
    pub repeat: i32,
    #[validate(custom(function = "not_blank"))]
    pub equipment_id: String,
}

/// DTO for updating an existing plan. Absent fields are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdatePlan {
    #[validate(custom(function = "valid_uuid"))]
    pub id: String,
    #[validate(custom(function = "not_blank"))]
    pub name: Option<String>,
    #[validate(custom(function = "non_zero"))]
    pub repeat: Option<i32>,
    #[validate(custom(function = "not_blank"))]
    pub equipment_id: Option<String>,
}

impl UpdateTarget for UpdatePlan {
    fn target_id(&self) -> &str {
        &self.id
    }
}

impl Entity for Plan {
    const NAME: &'static str = "plan";
    type Create = CreatePlan;
    type Update = UpdatePlan;

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

    fn from_create(id: EntityId, now: Timestamp, input: CreatePlan) -> Self {
        Self {
            id,
            name: input.name,
            repeat: input.repeat,
            equipment_id: input.equipment_id,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_update(&mut self, patch: UpdatePlan) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(repeat) = patch.repeat {
            self.repeat = repeat;
        }
        if let Some(equipment_id) = patch.equipment_id {
            self.equipment_id = equipment_id;
        }
    }
}

impl Table for Plan {
    const TABLE: &'static str = "plans";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "repeat",
        "equipment_id",
        "created_at",
        "updated_at",
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["name", "equipment_id"];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.id.into(),
            self.name.clone().into(),
            self.repeat.into(),
            self.equipment_id.clone().into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }
}
