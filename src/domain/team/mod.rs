//! Team domain types

pub mod entity;
pub mod repository;

pub use entity::{Team, TeamId, TeamValidationError};
pub use repository::TeamRepository;
