//! gRPC surface of the CRUD pipeline plus the HTTP health endpoint.

pub mod auth;
pub mod config;
pub mod error;
pub mod grpc;
pub mod pipeline;
pub mod routes;
pub mod state;
