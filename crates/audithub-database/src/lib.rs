//! # audithub-database
//!
//! PostgreSQL connection management, the store contracts consumed by the
//! service and worker layers, and their sqlx repository implementations.
//!
//! The contracts ([`store::AuditStore`], [`store::UsageStore`],
//! [`store::JobStore`]) are object-safe async traits so that tests can
//! substitute in-memory fakes for the Postgres-backed repositories.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod store;
