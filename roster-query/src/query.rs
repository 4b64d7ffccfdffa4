//! Query composition
//!
//! A [`ContentQuery`] is the complete description of one content read: the
//! predicate set, the member → team left join, the projection, the ordering and
//! an optional offset/limit window. The matching [`CountQuery`] can only be
//! obtained from a content query, so both reads always share the same
//! predicate set and join.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::executor::QueryExecutor;
use crate::model::MemberTeamRow;
use crate::order::Sort;
use crate::predicate::PredicateSet;

/// How members are joined to teams. Always a left join: members without a
/// team survive the join and are only removed by a team predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinPolicy {
    #[default]
    LeftTeam,
}

/// Columns materialized into each result row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Projection {
    /// member id, username, age, team id, team name
    #[default]
    MemberTeam,
}

/// Offset/limit slice of a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Window {
    offset: u64,
    limit: u64,
}

impl Window {
    /// Validate signed input
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when `offset` or `limit` is negative.
    pub fn new(offset: i64, limit: i64) -> Result<Self> {
        let offset = u64::try_from(offset).map_err(|_| {
            Error::invalid_argument(format!("offset must not be negative, got {}", offset))
        })?;
        let limit = u64::try_from(limit).map_err(|_| {
            Error::invalid_argument(format!("limit must not be negative, got {}", limit))
        })?;
        Ok(Self { offset, limit })
    }

    pub const fn from_parts(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    pub const fn offset(&self) -> u64 {
        self.offset
    }

    pub const fn limit(&self) -> u64 {
        self.limit
    }

    pub const fn is_empty(&self) -> bool {
        self.limit == 0
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset {} limit {}", self.offset, self.limit)
    }
}

/// One content read
#[derive(Debug, Clone, Copy)]
pub struct ContentQuery<'a> {
    predicates: &'a PredicateSet,
    join: JoinPolicy,
    projection: Projection,
    sort: &'a Sort,
    window: Option<Window>,
}

impl<'a> ContentQuery<'a> {
    /// Compose a content query. `window: None` reads every matching row.
    pub fn compose(predicates: &'a PredicateSet, sort: &'a Sort, window: Option<Window>) -> Self {
        Self {
            predicates,
            join: JoinPolicy::LeftTeam,
            projection: Projection::MemberTeam,
            sort,
            window,
        }
    }

    /// The total-count read over the same predicate set and join
    pub fn count_query(&self) -> CountQuery<'a> {
        CountQuery {
            predicates: self.predicates,
            join: self.join,
        }
    }

    pub fn predicates(&self) -> &'a PredicateSet {
        self.predicates
    }

    pub fn join(&self) -> JoinPolicy {
        self.join
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn sort(&self) -> &'a Sort {
        self.sort
    }

    pub fn window(&self) -> Option<Window> {
        self.window
    }
}

impl fmt::Display for ContentQuery<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "where [{}]", self.predicates)?;
        if !self.sort.is_unsorted() {
            write!(f, " order by [{}]", self.sort)?;
        }
        if let Some(window) = self.window {
            write!(f, " {}", window)?;
        }
        Ok(())
    }
}

/// Total-count read. Only constructible through [`ContentQuery::count_query`].
#[derive(Debug, Clone, Copy)]
pub struct CountQuery<'a> {
    predicates: &'a PredicateSet,
    join: JoinPolicy,
}

impl<'a> From<&ContentQuery<'a>> for CountQuery<'a> {
    fn from(query: &ContentQuery<'a>) -> Self {
        query.count_query()
    }
}

impl<'a> CountQuery<'a> {
    pub fn predicates(&self) -> &'a PredicateSet {
        self.predicates
    }

    pub fn join(&self) -> JoinPolicy {
        self.join
    }
}

/// Run a content query. A zero-limit window yields no rows without touching
/// the executor.
pub async fn fetch_content<E: QueryExecutor>(
    executor: &E,
    query: &ContentQuery<'_>,
) -> Result<Vec<MemberTeamRow>> {
    if query.window().is_some_and(|w| w.is_empty()) {
        tracing::debug!("Zero-limit window, content query not executed");
        return Ok(Vec::new());
    }
    tracing::debug!("Executing content query: {}", query);
    Ok(executor.fetch(query).await?)
}
