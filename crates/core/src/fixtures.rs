//! A minimal entity used by the unit tests of the generic pipeline.

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entity::{Entity, UpdateTarget};
use crate::types::{EntityId, Timestamp};
use crate::validation::{non_zero, not_blank, valid_uuid};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: EntityId,
    pub name: String,
    pub quantity: i32,
    pub color: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateWidget {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(custom(function = "non_zero"))]
    pub quantity: i32,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct UpdateWidget {
    #[validate(custom(function = "valid_uuid"))]
    pub id: String,
    #[validate(custom(function = "not_blank"))]
    pub name: Option<String>,
    #[validate(custom(function = "non_zero"))]
    pub quantity: Option<i32>,
    pub color: Option<String>,
}

impl UpdateTarget for UpdateWidget {
    fn target_id(&self) -> &str {
        &self.id
    }
}

impl Entity for Widget {
    const NAME: &'static str = "widget";
    type Create = CreateWidget;
    type Update = UpdateWidget;

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

    fn from_create(id: EntityId, now: Timestamp, input: CreateWidget) -> Self {
        Self {
            id,
            name: input.name,
            quantity: input.quantity,
            color: input.color,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_update(&mut self, patch: UpdateWidget) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
        if let Some(color) = patch.color {
            self.color = Some(color);
        }
    }
}

/// A stored widget with a random id.
pub fn widget(name: &str, quantity: i32) -> Widget {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Widget {
        id: EntityId::new_v4(),
        name: name.to_string(),
        quantity,
        color: None,
        created_at: at,
        updated_at: at,
    }
}
