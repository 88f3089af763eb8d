//! Read-only member projections

use serde::Serialize;

use super::entity::{Member, MemberId};
use crate::domain::team::Team;

/// Flattened read-only view of a member and its team name.
///
/// Has no identity or lifecycle of its own; constructed only as a query
/// result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberSummary {
    pub id: MemberId,
    pub name: String,
    pub team_name: Option<String>,
}

impl MemberSummary {
    pub fn new(id: MemberId, name: impl Into<String>, team_name: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            team_name,
        }
    }
}

/// A member together with its eagerly fetched team, if any
#[derive(Debug, Clone, PartialEq)]
pub struct MemberWithTeam {
    pub member: Member,
    pub team: Option<Team>,
}
