//! Infrastructure layer - store-backed repository implementations

pub mod db;
pub mod logging;
pub mod member;
pub mod store;
pub mod team;

pub use db::Database;
pub use member::{InMemoryMemberRepository, PostgresMemberRepository};
pub use store::InMemoryStore;
pub use team::{InMemoryTeamRepository, PostgresTeamRepository};
