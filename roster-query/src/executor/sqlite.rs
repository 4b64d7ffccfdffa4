//! SQLite executor
//!
//! Renders composed queries with [`sqlx::QueryBuilder`]. Every predicate value
//! is bound, never interpolated; column names come from [`Column::qualified`].
//!
//! [`Column::qualified`]: crate::predicate::Column::qualified

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::{ExecutionError, QueryOperation};
use crate::model::{Member, MemberTeamRow, Team};
use crate::order::Sort;
use crate::predicate::{PredicateSet, Value};
use crate::query::{ContentQuery, CountQuery, JoinPolicy, Projection};

use super::QueryExecutor;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS team (
        team_id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS member (
        member_id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT,
        age INTEGER NOT NULL,
        team_id INTEGER REFERENCES team(team_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_member_team_id ON member(team_id)",
];

/// Executor backed by a sqlx SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the member and team tables if they do not exist
    pub async fn migrate(&self) -> Result<(), ExecutionError> {
        for statement in SCHEMA {
            sqlx::query(*statement)
                .execute(&self.pool)
                .await
                .map_err(with_operation(QueryOperation::Migrate))?;
        }
        tracing::debug!("Member/team schema ready");
        Ok(())
    }

    /// Insert a team and return it with its generated id
    pub async fn insert_team(&self, name: &str) -> Result<Team, ExecutionError> {
        let id = sqlx::query("INSERT INTO team (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(with_operation(QueryOperation::Insert))?
            .last_insert_rowid();
        Ok(Team {
            id,
            name: name.to_string(),
        })
    }

    /// Insert a member and return it with its generated id
    ///
    /// # Errors
    ///
    /// Constraint violation when `team_id` names a team that does not exist.
    pub async fn insert_member(
        &self,
        username: Option<&str>,
        age: i32,
        team_id: Option<i64>,
    ) -> Result<Member, ExecutionError> {
        let id = sqlx::query("INSERT INTO member (username, age, team_id) VALUES (?, ?, ?)")
            .bind(username)
            .bind(age)
            .bind(team_id)
            .execute(&self.pool)
            .await
            .map_err(with_operation(QueryOperation::Insert))?
            .last_insert_rowid();
        Ok(Member {
            id,
            username: username.map(str::to_string),
            age,
            team_id,
        })
    }

    /// Remove a member, returning whether it existed
    pub async fn delete_member(&self, member_id: i64) -> Result<bool, ExecutionError> {
        let result = sqlx::query("DELETE FROM member WHERE member_id = ?")
            .bind(member_id)
            .execute(&self.pool)
            .await
            .map_err(with_operation(QueryOperation::Delete))?;
        Ok(result.rows_affected() > 0)
    }

    /// Members referencing the team
    pub async fn members_of(&self, team_id: i64) -> Result<Vec<Member>, ExecutionError> {
        let rows: Vec<(i64, Option<String>, i32, Option<i64>)> = sqlx::query_as(
            "SELECT member_id, username, age, team_id FROM member \
             WHERE team_id = ? ORDER BY member_id",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(with_operation(QueryOperation::Fetch))?;
        Ok(rows
            .into_iter()
            .map(|(id, username, age, team_id)| Member {
                id,
                username,
                age,
                team_id,
            })
            .collect())
    }
}

fn with_operation(operation: QueryOperation) -> impl FnOnce(sqlx::Error) -> ExecutionError {
    move |e| ExecutionError::from(e).with_operation(operation)
}

fn push_select(builder: &mut QueryBuilder<'_, Sqlite>, projection: Projection) {
    match projection {
        Projection::MemberTeam => builder.push(
            "SELECT m.member_id AS member_id, m.username AS username, m.age AS age, \
             t.team_id AS team_id, t.name AS team_name",
        ),
    };
}

fn push_from(builder: &mut QueryBuilder<'_, Sqlite>, join: JoinPolicy) {
    match join {
        JoinPolicy::LeftTeam => {
            builder.push(" FROM member m LEFT JOIN team t ON m.team_id = t.team_id")
        }
    };
}

fn push_where(builder: &mut QueryBuilder<'_, Sqlite>, predicates: &PredicateSet) {
    for (i, predicate) in predicates.active().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        builder.push(predicate.column.qualified());
        builder.push(format!(" {} ", predicate.comparison));
        match &predicate.value {
            Value::Text(s) => builder.push_bind(s.clone()),
            Value::Integer(n) => builder.push_bind(*n),
        };
    }
}

fn push_order_by(builder: &mut QueryBuilder<'_, Sqlite>, sort: &Sort) {
    for (i, spec) in sort.items().iter().enumerate() {
        builder.push(if i == 0 { " ORDER BY " } else { ", " });
        builder.push(spec.to_string());
    }
}

fn to_sql_int(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl QueryExecutor for SqliteExecutor {
    async fn fetch(&self, query: &ContentQuery<'_>) -> Result<Vec<MemberTeamRow>, ExecutionError> {
        let mut builder = QueryBuilder::<Sqlite>::new("");
        push_select(&mut builder, query.projection());
        push_from(&mut builder, query.join());
        push_where(&mut builder, query.predicates());
        push_order_by(&mut builder, query.sort());
        if let Some(window) = query.window() {
            builder.push(" LIMIT ");
            builder.push_bind(to_sql_int(window.limit()));
            builder.push(" OFFSET ");
            builder.push_bind(to_sql_int(window.offset()));
        }

        tracing::trace!(sql = builder.sql(), "Rendered content query");
        builder
            .build_query_as::<MemberTeamRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(with_operation(QueryOperation::Fetch))
    }

    async fn count(&self, query: &CountQuery<'_>) -> Result<u64, ExecutionError> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(m.member_id)");
        push_from(&mut builder, query.join());
        push_where(&mut builder, query.predicates());

        tracing::trace!(sql = builder.sql(), "Rendered count query");
        let total: i64 = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(with_operation(QueryOperation::Count))?;
        Ok(u64::try_from(total).unwrap_or(0))
    }
}
