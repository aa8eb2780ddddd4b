//! Repository implementations backed by PostgreSQL.

pub mod pg_repository;

pub use pg_repository::PgRepository;
