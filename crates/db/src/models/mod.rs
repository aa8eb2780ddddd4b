//! Row models and request DTOs for every stored entity.

pub mod plan;
pub mod session;
