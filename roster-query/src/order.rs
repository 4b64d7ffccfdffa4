//! Explicit, null-aware ordering
//!
//! Every [`OrderSpec`] states where NULL keys go; there is no implicit
//! default. A [`Sort`] with no items leaves row order unspecified.
//!
//! # Example
//!
//! ```rust
//! use roster_query::order::{NullsOrder, OrderSpec, Sort};
//! use roster_query::predicate::Column;
//!
//! let sort = Sort::by(OrderSpec::desc(Column::Age, NullsOrder::Last))
//!     .then(OrderSpec::asc(Column::Username, NullsOrder::Last));
//! assert_eq!(sort.to_string(), "m.age DESC NULLS LAST, m.username ASC NULLS LAST");
//! ```

use std::cmp::Ordering;
use std::fmt;

use crate::model::MemberTeamRow;
use crate::predicate::Column;

/// Direction for ordering results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderDirection {
    /// Sort in ascending order (A-Z, 0-9)
    Ascending,
    /// Sort in descending order (Z-A, 9-0)
    Descending,
}

impl OrderDirection {
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}

/// Placement of NULL keys, independent of direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullsOrder {
    First,
    Last,
}

impl NullsOrder {
    pub const fn sql(self) -> &'static str {
        match self {
            Self::First => "NULLS FIRST",
            Self::Last => "NULLS LAST",
        }
    }
}

/// One ordering item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderSpec {
    pub column: Column,
    pub direction: OrderDirection,
    pub nulls: NullsOrder,
}

impl OrderSpec {
    pub const fn new(column: Column, direction: OrderDirection, nulls: NullsOrder) -> Self {
        Self {
            column,
            direction,
            nulls,
        }
    }

    pub const fn asc(column: Column, nulls: NullsOrder) -> Self {
        Self::new(column, OrderDirection::Ascending, nulls)
    }

    pub const fn desc(column: Column, nulls: NullsOrder) -> Self {
        Self::new(column, OrderDirection::Descending, nulls)
    }

    /// Compare two rows on this item alone
    pub fn compare(&self, a: &MemberTeamRow, b: &MemberTeamRow) -> Ordering {
        match (self.column.value_of(a), self.column.value_of(b)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => match self.nulls {
                NullsOrder::First => Ordering::Less,
                NullsOrder::Last => Ordering::Greater,
            },
            (Some(_), None) => match self.nulls {
                NullsOrder::First => Ordering::Greater,
                NullsOrder::Last => Ordering::Less,
            },
            (Some(x), Some(y)) => {
                let ordering = x.compare(&y).unwrap_or(Ordering::Equal);
                match self.direction {
                    OrderDirection::Ascending => ordering,
                    OrderDirection::Descending => ordering.reverse(),
                }
            }
        }
    }
}

impl fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.direction, self.nulls.sql())
    }
}

/// Ordered list of ordering items; earlier items take precedence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sort {
    items: Vec<OrderSpec>,
}

impl Sort {
    /// No ordering: row order is whatever the store returns
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(spec: OrderSpec) -> Self {
        Self { items: vec![spec] }
    }

    /// Append a tie-break item
    #[must_use]
    pub fn then(mut self, spec: OrderSpec) -> Self {
        self.items.push(spec);
        self
    }

    pub fn is_unsorted(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[OrderSpec] {
        &self.items
    }

    /// Lexicographic comparison over all items
    pub fn compare(&self, a: &MemberTeamRow, b: &MemberTeamRow) -> Ordering {
        self.items
            .iter()
            .map(|spec| spec.compare(a, b))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl FromIterator<OrderSpec> for Sort {
    fn from_iter<I: IntoIterator<Item = OrderSpec>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, spec) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", spec)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, username: Option<&str>, age: i32) -> MemberTeamRow {
        MemberTeamRow {
            member_id: id,
            username: username.map(str::to_string),
            age,
            team_id: None,
            team_name: None,
        }
    }

    #[test]
    fn test_nulls_last_ascending_and_descending() {
        let named = row(1, Some("a"), 1);
        let nameless = row(2, None, 1);
        for spec in [
            OrderSpec::asc(Column::Username, NullsOrder::Last),
            OrderSpec::desc(Column::Username, NullsOrder::Last),
        ] {
            assert_eq!(spec.compare(&nameless, &named), Ordering::Greater);
            assert_eq!(spec.compare(&named, &nameless), Ordering::Less);
        }
    }

    #[test]
    fn test_nulls_first() {
        let spec = OrderSpec::asc(Column::TeamName, NullsOrder::First);
        let mut with_team = row(1, None, 1);
        with_team.team_name = Some("teamA".to_string());
        let without_team = row(2, None, 1);
        assert_eq!(spec.compare(&without_team, &with_team), Ordering::Less);
    }

    #[test]
    fn test_sort_tie_break() {
        let sort = Sort::by(OrderSpec::desc(Column::Age, NullsOrder::Last))
            .then(OrderSpec::asc(Column::Username, NullsOrder::Last));
        let mut rows = vec![
            row(1, None, 100),
            row(2, Some("member6"), 100),
            row(3, Some("member5"), 100),
            row(4, Some("member9"), 90),
        ];
        rows.sort_by(|a, b| sort.compare(a, b));
        let ids: Vec<i64> = rows.iter().map(|r| r.member_id).collect();
        assert_eq!(ids, vec![3, 2, 1, 4]);
    }

    #[test]
    fn test_unsorted_compares_equal() {
        let sort = Sort::unsorted();
        assert!(sort.is_unsorted());
        assert_eq!(
            sort.compare(&row(1, Some("a"), 1), &row(2, Some("b"), 2)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_display() {
        let sort: Sort = [
            OrderSpec::asc(Column::TeamName, NullsOrder::First),
            OrderSpec::desc(Column::MemberId, NullsOrder::Last),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            sort.to_string(),
            "t.name ASC NULLS FIRST, m.member_id DESC NULLS LAST"
        );
    }
}
