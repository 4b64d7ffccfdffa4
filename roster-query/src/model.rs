//! Members, teams, the search condition and the projected result row

use serde::{Deserialize, Serialize};

/// A team. Teams do not hold their members; "members of a team" is a
/// query-time view over [`Member::team_id`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
}

/// A member with an optional reference to its team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    /// Display name. Nullable in the store.
    pub username: Option<String>,
    pub age: i32,
    pub team_id: Option<i64>,
}

/// Sparse search condition. Every field is optional; `None` (or a blank
/// string) means "no constraint", never "match null".
///
/// Field names follow the wire form used by callers binding it from a request:
///
/// ```rust
/// use roster_query::MemberSearchCondition;
///
/// let condition: MemberSearchCondition =
///     serde_json::from_str(r#"{"teamName":"teamB","ageGoe":35}"#).unwrap();
/// assert_eq!(condition.team_name.as_deref(), Some("teamB"));
/// assert_eq!(condition.age_goe, Some(35));
/// assert!(condition.username.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemberSearchCondition {
    /// Exact member username
    pub username: Option<String>,
    /// Exact team name
    pub team_name: Option<String>,
    /// Inclusive lower bound on age
    pub age_goe: Option<i32>,
    /// Inclusive upper bound on age
    pub age_loe: Option<i32>,
}

impl MemberSearchCondition {
    /// Condition with no constraints
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn team_name(mut self, team_name: impl Into<String>) -> Self {
        self.team_name = Some(team_name.into());
        self
    }

    #[must_use]
    pub fn age_goe(mut self, age: i32) -> Self {
        self.age_goe = Some(age);
        self
    }

    #[must_use]
    pub fn age_loe(mut self, age: i32) -> Self {
        self.age_loe = Some(age);
        self
    }
}

/// One result row: a member left-joined with its team. `team_id` and
/// `team_name` are `None` exactly when the member has no team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlite", derive(sqlx::FromRow))]
pub struct MemberTeamRow {
    pub member_id: i64,
    pub username: Option<String>,
    pub age: i32,
    pub team_id: Option<i64>,
    pub team_name: Option<String>,
}

impl MemberTeamRow {
    /// Join a member with its (optional) team
    pub fn join(member: &Member, team: Option<&Team>) -> Self {
        Self {
            member_id: member.id,
            username: member.username.clone(),
            age: member.age,
            team_id: team.map(|t| t.id),
            team_name: team.map(|t| t.name.clone()),
        }
    }
}
