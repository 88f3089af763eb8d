//! Roster
//!
//! A typed persistence layer for a member directory backed by PostgreSQL:
//! - Repository traits per entity kind with fixed, compile-checked finders
//! - Structured predicates instead of method-name-derived queries
//! - Paged and sliced listings, DTO/scalar projections
//! - Set-based bulk updates with a caller-visible staleness contract
//! - Pessimistic locking and native-query escape hatches on the Postgres
//!   implementations
//!
//! The in-memory implementations mirror the Postgres semantics (identity
//! assignment, version checks, referential integrity) and back the test
//! suite without a running database.

pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::DomainError;
pub use infrastructure::db::Database;
