//! Entity-agnostic CRUD pipeline: domain errors, validation, filters, and the
//! capability traits (`Repository`, `Service`, `Interceptor`) each layer
//! implements, plus the generic service and authorizing interceptor.
//!
//! This crate has no storage or transport dependencies so every layer can be
//! exercised with in-process doubles.

pub mod access;
pub mod clock;
pub mod entity;
pub mod error;
pub mod filter;
pub mod interceptor;
pub mod memory;
pub mod repository;
pub mod roles;
pub mod search;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod fixtures;
