//! Team entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during team validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TeamValidationError {
    #[error("Team name cannot be empty")]
    EmptyName,

    #[error("Team name exceeds maximum length of {0} characters")]
    NameTooLong(usize),
}

const MAX_TEAM_NAME_LENGTH: usize = 100;

/// Store-assigned team identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamId(i64);

impl TeamId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team entity, the parent of zero or more members.
///
/// A team with no identity has not been persisted yet; the store assigns one
/// on first save and it never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    id: Option<TeamId>,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Team {
    /// Create a new, unpersisted team
    pub fn new(name: impl Into<String>) -> Result<Self, TeamValidationError> {
        let name = validate_team_name(name.into())?;
        let now = Utc::now();

        Ok(Self {
            id: None,
            name,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> Option<TeamId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// True until the store has assigned an identity
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Rename the team
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), TeamValidationError> {
        self.name = validate_team_name(name.into())?;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Rebuild a persisted team from stored columns
    pub(crate) fn restore(
        id: TeamId,
        name: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Some(id),
            name,
            created_at,
            updated_at,
        }
    }

    /// Attach the identity assigned by the store on first insert
    pub(crate) fn with_id(mut self, id: TeamId) -> Self {
        self.id = Some(id);
        self
    }
}

fn validate_team_name(name: String) -> Result<String, TeamValidationError> {
    if name.is_empty() {
        return Err(TeamValidationError::EmptyName);
    }

    if name.chars().count() > MAX_TEAM_NAME_LENGTH {
        return Err(TeamValidationError::NameTooLong(MAX_TEAM_NAME_LENGTH));
    }

    Ok(name)
}
