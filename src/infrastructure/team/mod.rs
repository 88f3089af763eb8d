//! Team repository implementations

pub mod in_memory_repository;
pub mod postgres_repository;

pub use in_memory_repository::InMemoryTeamRepository;
pub use postgres_repository::PostgresTeamRepository;
