//! In-memory team repository implementation

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::team::{Team, TeamId, TeamRepository};
use crate::domain::traits::Repository;
use crate::domain::DomainError;
use crate::infrastructure::store::InMemoryStore;

/// In-memory implementation of TeamRepository
#[derive(Debug, Default)]
pub struct InMemoryTeamRepository {
    store: Arc<InMemoryStore>,
}

impl InMemoryTeamRepository {
    /// Create a repository over its own private store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository sharing a store with other repositories
    pub fn with_store(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Repository<Team, TeamId> for InMemoryTeamRepository {
    async fn save(&self, team: Team) -> Result<Team, DomainError> {
        let mut state = self.store.inner.write().await;

        let name_taken = state.teams.values().any(|existing| {
            existing.name() == team.name() && existing.id() != team.id()
        });

        if name_taken {
            return Err(DomainError::conflict(format!(
                "Team '{}' already exists",
                team.name()
            )));
        }

        match team.id() {
            None => {
                let id = state.next_team_id();
                let persisted = team.with_id(TeamId::new(id));
                state.teams.insert(id, persisted.clone());
                Ok(persisted)
            }
            Some(id) => {
                if !state.teams.contains_key(&id.value()) {
                    return Err(DomainError::not_found(format!("Team '{}' not found", id)));
                }

                state.teams.insert(id.value(), team.clone());
                Ok(team)
            }
        }
    }

    async fn find_by_id(&self, id: &TeamId) -> Result<Option<Team>, DomainError> {
        let state = self.store.inner.read().await;
        Ok(state.teams.get(&id.value()).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Team>, DomainError> {
        let state = self.store.inner.read().await;
        let mut teams: Vec<Team> = state.teams.values().cloned().collect();
        teams.sort_by_key(|team| team.id().map(|id| id.value()));
        Ok(teams)
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let state = self.store.inner.read().await;
        Ok(state.teams.len() as u64)
    }

    async fn delete(&self, team: &Team) -> Result<(), DomainError> {
        let id = team
            .id()
            .ok_or_else(|| DomainError::not_found("Team has not been persisted"))?;

        let mut state = self.store.inner.write().await;

        let referenced = state
            .members
            .values()
            .any(|member| member.team_id() == Some(id));

        if referenced {
            return Err(DomainError::conflict(format!(
                "Team '{}' still has members",
                id
            )));
        }

        if state.teams.remove(&id.value()).is_none() {
            return Err(DomainError::not_found(format!("Team '{}' not found", id)));
        }

        Ok(())
    }
}

#[async_trait]
impl TeamRepository for InMemoryTeamRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Team>, DomainError> {
        let state = self.store.inner.read().await;
        Ok(state
            .teams
            .values()
            .find(|team| team.name() == name)
            .cloned())
    }
}
