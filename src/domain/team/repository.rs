//! Team repository trait

use async_trait::async_trait;

use super::entity::{Team, TeamId};
use crate::domain::traits::Repository;
use crate::domain::DomainError;

/// Repository trait for team storage.
///
/// Deleting a team that members still reference is rejected with
/// `DomainError::Conflict`; the store never cascades the delete.
#[async_trait]
pub trait TeamRepository: Repository<Team, TeamId> {
    /// Look up a team by its unique name
    async fn find_by_name(&self, name: &str) -> Result<Option<Team>, DomainError>;
}
