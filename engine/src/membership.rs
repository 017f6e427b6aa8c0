//! Team membership snapshot, fixed for one build/evaluation cycle.
//!
//! The service layer resolves every team referenced by the declarations,
//! builds one snapshot, and hands it to the tree builder. The snapshot is
//! never mutated afterwards: every file evaluated against a tree sees the
//! same team rosters. Teams that failed to resolve are simply absent.

use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MembershipSnapshot {
    teams: BTreeMap<String, BTreeSet<String>>,
}

impl MembershipSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resolved team roster. Replaces any previous roster for the
    /// same handle; snapshots are built once, so this only matters to tests.
    pub fn insert_team(&mut self, team: &str, members: BTreeSet<String>) {
        self.teams.insert(team.to_string(), members);
    }

    pub fn contains_team(&self, team: &str) -> bool {
        self.teams.contains_key(team)
    }

    pub fn members_of(&self, team: &str) -> Option<&BTreeSet<String>> {
        self.teams.get(team)
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }
}
