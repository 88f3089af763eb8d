//! Shared in-memory backing store.
//!
//! Members and teams live in one store so the repositories can enforce the
//! same referential rules the Postgres schema does: a member may only
//! reference an existing team, and a team with members cannot be deleted.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::domain::member::Member;
use crate::domain::team::Team;

#[derive(Debug, Default)]
pub(crate) struct StoreState {
    pub members: HashMap<i64, Member>,
    pub teams: HashMap<i64, Team>,
    next_member_id: i64,
    next_team_id: i64,
}

impl StoreState {
    /// Hand out the next member identity
    pub fn next_member_id(&mut self) -> i64 {
        self.next_member_id += 1;
        self.next_member_id
    }

    /// Hand out the next team identity
    pub fn next_team_id(&mut self) -> i64 {
        self.next_team_id += 1;
        self.next_team_id
    }
}

/// In-memory store shared by the in-memory repositories
#[derive(Debug, Default)]
pub struct InMemoryStore {
    pub(crate) inner: RwLock<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}
