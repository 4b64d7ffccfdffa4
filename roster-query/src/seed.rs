//! Sample roster for local runs and tests
//!
//! Two teams, `teamA` and `teamB`, and one hundred members `member0` to
//! `member99`. Member `i` is `i` years old and belongs to `teamA` when `i` is
//! even, `teamB` otherwise.

#[cfg(feature = "sqlite")]
use crate::executor::SqliteExecutor;
use crate::error::ExecutionError;
use crate::executor::MemoryExecutor;

pub const SAMPLE_TEAMS: [&str; 2] = ["teamA", "teamB"];

pub const SAMPLE_MEMBER_COUNT: i32 = 100;

/// A member of the sample roster before it is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedMember {
    pub username: String,
    pub age: i32,
    /// Index into [`SAMPLE_TEAMS`]
    pub team: usize,
}

/// The sample members in insertion order
pub fn sample_roster() -> Vec<SeedMember> {
    (0..SAMPLE_MEMBER_COUNT)
        .map(|i| SeedMember {
            username: format!("member{}", i),
            age: i,
            team: if i % 2 == 0 { 0 } else { 1 },
        })
        .collect()
}

/// Store the sample teams and members in an in-memory executor
pub fn load_into_memory(store: &MemoryExecutor) -> Result<(), ExecutionError> {
    let team_ids = SAMPLE_TEAMS
        .iter()
        .map(|name| store.insert_team(*name).map(|t| t.id))
        .collect::<Result<Vec<_>, _>>()?;
    for member in sample_roster() {
        store.insert_member(Some(&member.username), member.age, Some(team_ids[member.team]))?;
    }
    tracing::info!(
        teams = SAMPLE_TEAMS.len(),
        members = SAMPLE_MEMBER_COUNT,
        "Sample roster loaded"
    );
    Ok(())
}

/// Store the sample teams and members through SQLite. The schema must exist.
#[cfg(feature = "sqlite")]
pub async fn load_into_sqlite(store: &SqliteExecutor) -> Result<(), ExecutionError> {
    let mut team_ids = Vec::with_capacity(SAMPLE_TEAMS.len());
    for name in SAMPLE_TEAMS {
        team_ids.push(store.insert_team(name).await?.id);
    }
    for member in sample_roster() {
        store
            .insert_member(Some(&member.username), member.age, Some(team_ids[member.team]))
            .await?;
    }
    tracing::info!(
        teams = SAMPLE_TEAMS.len(),
        members = SAMPLE_MEMBER_COUNT,
        "Sample roster loaded"
    );
    Ok(())
}
