//! Shared repository abstractions

pub mod repository;

pub use repository::Repository;
