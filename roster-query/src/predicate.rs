//! Predicate construction from a sparse search condition
//!
//! A [`MemberSearchCondition`] becomes a [`PredicateSet`]: one slot per filter
//! field, each holding either a concrete [`Predicate`] or `None` when the field
//! places no constraint. Slots combine with AND only, so the set is order- and
//! grouping-insensitive and can be handed to the query composer as a flat list.
//!
//! # Example
//!
//! ```rust
//! use roster_query::predicate::{age_goe, team_name_eq, PredicateSet};
//! use roster_query::MemberSearchCondition;
//!
//! let condition = MemberSearchCondition::new().team_name("teamB").age_goe(35);
//! let predicates = PredicateSet::from_condition(&condition);
//! assert_eq!(predicates.len(), 2);
//!
//! // Same slots supplied in another order, plus an explicit "no constraint".
//! let shuffled = PredicateSet::from_slots([age_goe(Some(35)), None, team_name_eq(Some("teamB"))]);
//! assert_eq!(predicates, shuffled);
//! ```

use std::cmp::Ordering;
use std::fmt;

use crate::model::{MemberSearchCondition, MemberTeamRow};

/// A column of the member/team join that predicates and orderings refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    /// `member.member_id`
    MemberId,
    /// `member.username`
    Username,
    /// `member.age`
    Age,
    /// `team.team_id`
    TeamId,
    /// `team.name`
    TeamName,
}

impl Column {
    /// Qualified SQL name in the `member m LEFT JOIN team t` shape
    pub const fn qualified(self) -> &'static str {
        match self {
            Self::MemberId => "m.member_id",
            Self::Username => "m.username",
            Self::Age => "m.age",
            Self::TeamId => "t.team_id",
            Self::TeamName => "t.name",
        }
    }

    /// Whether the column lives on the joined team
    pub const fn is_team_column(self) -> bool {
        matches!(self, Self::TeamId | Self::TeamName)
    }

    /// Value of this column in a projected row; `None` is SQL NULL
    pub fn value_of(self, row: &MemberTeamRow) -> Option<Value> {
        match self {
            Self::MemberId => Some(Value::Integer(row.member_id)),
            Self::Username => row.username.clone().map(Value::Text),
            Self::Age => Some(Value::Integer(i64::from(row.age))),
            Self::TeamId => row.team_id.map(Value::Integer),
            Self::TeamName => row.team_name.clone().map(Value::Text),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.qualified())
    }
}

/// Comparison operators used by the search predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Comparison {
    /// Equal to (=)
    Equal,
    /// Greater than or equal to (>=)
    GreaterThanOrEqual,
    /// Less than or equal to (<=)
    LessThanOrEqual,
}

impl Comparison {
    /// Whether `ordering` (actual compared to expected) satisfies the operator
    pub fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Equal => ordering == Ordering::Equal,
            Self::GreaterThanOrEqual => ordering != Ordering::Less,
            Self::LessThanOrEqual => ordering != Ordering::Greater,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::GreaterThanOrEqual => write!(f, ">="),
            Self::LessThanOrEqual => write!(f, "<="),
        }
    }
}

/// A literal compared against a column
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    Text(String),
    Integer(i64),
}

impl Value {
    /// Compare two values of the same type. Values of different types are
    /// incomparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

/// A single boolean condition over one column of the member/team join
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Predicate {
    pub column: Column,
    pub comparison: Comparison,
    pub value: Value,
}

impl Predicate {
    pub fn new(column: Column, comparison: Comparison, value: impl Into<Value>) -> Self {
        Self {
            column,
            comparison,
            value: value.into(),
        }
    }

    /// `column = value`
    pub fn eq(column: Column, value: impl Into<Value>) -> Self {
        Self::new(column, Comparison::Equal, value)
    }

    /// `column >= value`
    pub fn goe(column: Column, value: impl Into<Value>) -> Self {
        Self::new(column, Comparison::GreaterThanOrEqual, value)
    }

    /// `column <= value`
    pub fn loe(column: Column, value: impl Into<Value>) -> Self {
        Self::new(column, Comparison::LessThanOrEqual, value)
    }

    /// Evaluate against a joined row with SQL semantics: a NULL column never
    /// satisfies a comparison.
    pub fn matches(&self, row: &MemberTeamRow) -> bool {
        self.column
            .value_of(row)
            .and_then(|actual| actual.compare(&self.value))
            .is_some_and(|ordering| self.comparison.accepts(ordering))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::Text(s) => write!(f, "{} {} '{}'", self.column, self.comparison, s),
            Value::Integer(n) => write!(f, "{} {} {}", self.column, self.comparison, n),
        }
    }
}

/// True when the string is present and has a non-whitespace character
pub fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|s| !s.trim().is_empty())
}

/// `member.username = ?` when a non-blank username is supplied
pub fn username_eq(username: Option<&str>) -> Option<Predicate> {
    text_eq(Column::Username, username)
}

/// `team.name = ?` when a non-blank team name is supplied
pub fn team_name_eq(team_name: Option<&str>) -> Option<Predicate> {
    text_eq(Column::TeamName, team_name)
}

/// `member.age >= ?` when a bound is supplied (`Some(0)` is a real bound)
pub fn age_goe(age: Option<i32>) -> Option<Predicate> {
    age.map(|a| Predicate::goe(Column::Age, a))
}

/// `member.age <= ?` when a bound is supplied
pub fn age_loe(age: Option<i32>) -> Option<Predicate> {
    age.map(|a| Predicate::loe(Column::Age, a))
}

fn text_eq(column: Column, value: Option<&str>) -> Option<Predicate> {
    match value {
        Some(s) if has_text(Some(s)) => Some(Predicate::eq(column, s)),
        _ => None,
    }
}

/// The optional predicates of one search, combined with AND.
///
/// Equality compares the active predicates as a multiset: absent slots and
/// slot order do not matter.
#[derive(Debug, Clone, Default)]
pub struct PredicateSet {
    slots: Vec<Option<Predicate>>,
}

impl PredicateSet {
    /// One slot per field of the condition
    pub fn from_condition(condition: &MemberSearchCondition) -> Self {
        Self::from_slots([
            username_eq(condition.username.as_deref()),
            team_name_eq(condition.team_name.as_deref()),
            age_goe(condition.age_goe),
            age_loe(condition.age_loe),
        ])
    }

    /// Build from slots supplied in any order
    pub fn from_slots(slots: impl IntoIterator<Item = Option<Predicate>>) -> Self {
        Self {
            slots: slots.into_iter().collect(),
        }
    }

    /// A set with no constraints
    pub fn unconstrained() -> Self {
        Self::default()
    }

    /// Concrete predicates, skipping absent slots
    pub fn active(&self) -> impl Iterator<Item = &Predicate> {
        self.slots.iter().flatten()
    }

    /// All slots, absent ones included
    pub fn slots(&self) -> &[Option<Predicate>] {
        &self.slots
    }

    /// Number of active predicates
    pub fn len(&self) -> usize {
        self.active().count()
    }

    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }

    /// Whether any active predicate constrains a team column
    pub fn references_team(&self) -> bool {
        self.active().any(|p| p.column.is_team_column())
    }

    /// AND of all active predicates; an empty set accepts every row
    pub fn matches(&self, row: &MemberTeamRow) -> bool {
        self.active().all(|p| p.matches(row))
    }

    fn sorted_active(&self) -> Vec<&Predicate> {
        let mut active: Vec<&Predicate> = self.active().collect();
        active.sort();
        active
    }
}

impl PartialEq for PredicateSet {
    fn eq(&self, other: &Self) -> bool {
        self.sorted_active() == other.sorted_active()
    }
}

impl Eq for PredicateSet {}

impl fmt::Display for PredicateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for predicate in self.active() {
            if !first {
                write!(f, " AND ")?;
            }
            write!(f, "{}", predicate)?;
            first = false;
        }
        if first {
            write!(f, "<none>")?;
        }
        Ok(())
    }
}
