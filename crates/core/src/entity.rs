//! Per-entity schema description consumed by the generic pipeline.
//!
//! An entity supplies its record type plus the create and update payloads,
//! and knows how to build a record from a create payload and how to merge a
//! partial update onto itself. Everything else (validation sequencing,
//! stamping, authorization, storage) is shared.

use std::fmt::Debug;

use serde::Serialize;
use validator::Validate;

use crate::types::{EntityId, Timestamp};

/// Update payloads name the record they patch by its raw (unparsed) id.
pub trait UpdateTarget {
    fn target_id(&self) -> &str;
}

pub trait Entity: Clone + Debug + Serialize + Send + Sync + 'static {
    /// Lowercase singular name, used in permissions, logs and errors.
    const NAME: &'static str;

    type Create: Validate + Serialize + Debug + Send + Sync + 'static;
    type Update: Validate + UpdateTarget + Serialize + Debug + Send + Sync + 'static;

    fn id(&self) -> EntityId;
    fn created_at(&self) -> Timestamp;
    fn updated_at(&self) -> Timestamp;
    fn set_updated_at(&mut self, at: Timestamp);

    /// Build a new record. `input` has already passed validation.
    fn from_create(id: EntityId, now: Timestamp, input: Self::Create) -> Self;

    /// Overwrite every field present in `patch`; absent fields stay as they are.
    /// Never touches `id` or the timestamps.
    fn apply_update(&mut self, patch: Self::Update);

    /// Refresh `updated_at`, never letting it fall behind `created_at`.
    fn touch(&mut self, now: Timestamp) {
        let at = now.max(self.created_at());
        self.set_updated_at(at);
    }
}
