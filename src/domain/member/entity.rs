//! Member entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{validate_member_age, validate_member_name, MemberValidationError};
use crate::domain::team::TeamId;

/// Store-assigned member identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberId(i64);

impl MemberId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fields of a member usable in filters and sorts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberField {
    Id,
    Name,
    Age,
    CreatedAt,
}

/// Member entity.
///
/// A member without an identity is new and not yet persisted; the store
/// assigns the identity on first save and it never changes afterwards. The
/// `version` counter is bumped by every persisted write, including bulk
/// updates that bypass per-entity loading, so a copy read before such a
/// write fails its next save with a stale-data error instead of silently
/// overwriting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    id: Option<MemberId>,
    name: String,
    age: i32,
    team_id: Option<TeamId>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Member {
    /// Create a new, unpersisted member
    pub fn new(name: impl Into<String>, age: i32) -> Result<Self, MemberValidationError> {
        let name = name.into();
        validate_member_name(&name)?;
        validate_member_age(age)?;

        let now = Utc::now();

        Ok(Self {
            id: None,
            name,
            age,
            team_id: None,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Assign the member to a team
    pub fn in_team(mut self, team_id: TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }

    // Getters

    pub fn id(&self) -> Option<MemberId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> i32 {
        self.age
    }

    pub fn team_id(&self) -> Option<TeamId> {
        self.team_id
    }

    pub fn version(&self) -> i64 {
        self.version
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

    // Mutators

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), MemberValidationError> {
        let name = name.into();
        validate_member_name(&name)?;
        self.name = name;
        self.touch();
        Ok(())
    }

    pub fn set_age(&mut self, age: i32) -> Result<(), MemberValidationError> {
        validate_member_age(age)?;
        self.age = age;
        self.touch();
        Ok(())
    }

    pub fn set_team(&mut self, team_id: TeamId) {
        self.team_id = Some(team_id);
        self.touch();
    }

    pub fn clear_team(&mut self) {
        self.team_id = None;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Rebuild a persisted member from stored columns
    pub(crate) fn restore(
        id: MemberId,
        name: String,
        age: i32,
        team_id: Option<TeamId>,
        version: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Some(id),
            name,
            age,
            team_id,
            version,
            created_at,
            updated_at,
        }
    }

    /// Attach the identity assigned by the store on first insert
    pub(crate) fn with_id(mut self, id: MemberId) -> Self {
        self.id = Some(id);
        self
    }

    /// Record a persisted write: the stored version moved forward
    pub(crate) fn with_version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }
}
