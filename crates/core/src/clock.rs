//! Pluggable sources of time and identity.
//!
//! Services never call `Utc::now()` or `Uuid::now_v7()` directly; they go
//! through these traits so record construction is deterministic under test.

use std::sync::Mutex;

use chrono::Utc;

use crate::types::{EntityId, Timestamp};

/// Source of the current timestamp.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Source of fresh record identifiers.
pub trait IdGenerator: Send + Sync {
    fn new_id(&self) -> EntityId;
}

/// Wall-clock time in UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Time-ordered UUID v7 identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidV7Generator;

impl IdGenerator for UuidV7Generator {
    fn new_id(&self) -> EntityId {
        EntityId::now_v7()
    }
}

/// A clock pinned to a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<Timestamp>,
}

impl FixedClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Move the clock to `now`.
    pub fn set(&self, now: Timestamp) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Hands out the same identifier on every call.
#[derive(Debug, Clone, Copy)]
pub struct FixedIdGenerator(pub EntityId);

impl IdGenerator for FixedIdGenerator {
    fn new_id(&self) -> EntityId {
        self.0
    }
}
