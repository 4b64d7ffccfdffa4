//! In-process member/team store

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{ExecutionError, ExecutionErrorKind, QueryOperation};
use crate::model::{Member, MemberTeamRow, Team};
use crate::predicate::PredicateSet;
use crate::query::{ContentQuery, CountQuery, JoinPolicy};

use super::QueryExecutor;

#[derive(Debug, Default)]
struct Tables {
    teams: BTreeMap<i64, Team>,
    members: Vec<Member>,
    next_team_id: i64,
    next_member_id: i64,
}

/// Member and team tables held in memory.
///
/// Rows come back in insertion order when the query carries no ordering.
/// Ordering is stable, so rows that compare equal keep insertion order.
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    tables: RwLock<Tables>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a team and return it with its generated id
    pub fn insert_team(&self, name: impl Into<String>) -> Result<Team, ExecutionError> {
        let mut tables = self.write(QueryOperation::Insert)?;
        tables.next_team_id += 1;
        let team = Team {
            id: tables.next_team_id,
            name: name.into(),
        };
        tables.teams.insert(team.id, team.clone());
        Ok(team)
    }

    /// Insert a member and return it with its generated id
    ///
    /// # Errors
    ///
    /// Constraint violation when `team_id` names a team that does not exist.
    pub fn insert_member(
        &self,
        username: Option<&str>,
        age: i32,
        team_id: Option<i64>,
    ) -> Result<Member, ExecutionError> {
        let mut tables = self.write(QueryOperation::Insert)?;
        if let Some(id) = team_id {
            if !tables.teams.contains_key(&id) {
                return Err(ExecutionError::constraint_violation(
                    QueryOperation::Insert,
                    format!("team {} does not exist", id),
                ));
            }
        }
        tables.next_member_id += 1;
        let member = Member {
            id: tables.next_member_id,
            username: username.map(str::to_string),
            age,
            team_id,
        };
        tables.members.push(member.clone());
        Ok(member)
    }

    /// Remove a member, returning whether it existed
    pub fn delete_member(&self, member_id: i64) -> Result<bool, ExecutionError> {
        let mut tables = self.write(QueryOperation::Delete)?;
        let before = tables.members.len();
        tables.members.retain(|m| m.id != member_id);
        Ok(tables.members.len() != before)
    }

    /// Members referencing the team. Computed from the member table on each
    /// call.
    pub fn members_of(&self, team_id: i64) -> Result<Vec<Member>, ExecutionError> {
        let tables = self.read(QueryOperation::Fetch)?;
        Ok(tables
            .members
            .iter()
            .filter(|m| m.team_id == Some(team_id))
            .cloned()
            .collect())
    }

    fn matching_rows(
        &self,
        operation: QueryOperation,
        join: JoinPolicy,
        predicates: &PredicateSet,
    ) -> Result<Vec<MemberTeamRow>, ExecutionError> {
        let tables = self.read(operation)?;
        let rows = match join {
            JoinPolicy::LeftTeam => tables
                .members
                .iter()
                .map(|m| {
                    let team = m.team_id.and_then(|id| tables.teams.get(&id));
                    MemberTeamRow::join(m, team)
                })
                .filter(|row| predicates.matches(row))
                .collect(),
        };
        Ok(rows)
    }

    fn read(&self, operation: QueryOperation) -> Result<RwLockReadGuard<'_, Tables>, ExecutionError> {
        self.tables.read().map_err(|e| poisoned(operation, e))
    }

    fn write(
        &self,
        operation: QueryOperation,
    ) -> Result<RwLockWriteGuard<'_, Tables>, ExecutionError> {
        self.tables.write().map_err(|e| poisoned(operation, e))
    }
}

fn poisoned(operation: QueryOperation, e: impl std::fmt::Display) -> ExecutionError {
    ExecutionError::new(operation, ExecutionErrorKind::Other, e.to_string())
}

impl QueryExecutor for MemoryExecutor {
    async fn fetch(&self, query: &ContentQuery<'_>) -> Result<Vec<MemberTeamRow>, ExecutionError> {
        let mut rows = self.matching_rows(QueryOperation::Fetch, query.join(), query.predicates())?;
        let sort = query.sort();
        if !sort.is_unsorted() {
            rows.sort_by(|a, b| sort.compare(a, b));
        }
        let rows = match query.window() {
            Some(window) => rows
                .into_iter()
                .skip(usize::try_from(window.offset()).unwrap_or(usize::MAX))
                .take(usize::try_from(window.limit()).unwrap_or(usize::MAX))
                .collect(),
            None => rows,
        };
        Ok(rows)
    }

    async fn count(&self, query: &CountQuery<'_>) -> Result<u64, ExecutionError> {
        let rows = self.matching_rows(QueryOperation::Count, query.join(), query.predicates())?;
        Ok(rows.len() as u64)
    }
}
