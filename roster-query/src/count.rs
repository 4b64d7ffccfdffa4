//! Total-count planning
//!
//! A first page that came back short is the whole result set, so its total is
//! already known and the count query (which scans the same join again) can be
//! skipped. In every other case the content alone cannot tell "exactly a page
//! worth of rows" from "more rows beyond this page", and the count must run.

use std::fmt;

use serde::Serialize;

use crate::query::Window;

/// Outcome of inspecting a fetched content page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalPlan {
    /// The total follows from the content; no count query
    Known(u64),
    /// The count query must run
    CountRequired,
}

/// Decide whether the count query is needed after fetching `content_len` rows
/// through `window`.
///
/// ```rust
/// use roster_query::count::{plan_total, TotalPlan};
/// use roster_query::query::Window;
///
/// assert_eq!(plan_total(Window::from_parts(0, 10), 3), TotalPlan::Known(3));
/// assert_eq!(plan_total(Window::from_parts(0, 10), 10), TotalPlan::CountRequired);
/// assert_eq!(plan_total(Window::from_parts(10, 10), 2), TotalPlan::CountRequired);
/// ```
pub fn plan_total(window: Window, content_len: usize) -> TotalPlan {
    let content_len = content_len as u64;
    if window.offset() == 0 && content_len < window.limit() {
        TotalPlan::Known(content_len)
    } else {
        TotalPlan::CountRequired
    }
}

/// A counted total smaller than the rows already returned. Happens when rows
/// are deleted between the content read and the count read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InconsistentTotal {
    /// `offset + content_len` for the page that was returned
    pub expected_at_least: u64,
    /// What the count query reported
    pub counted: u64,
}

impl fmt::Display for InconsistentTotal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "count query returned {} but at least {} rows were read",
            self.counted, self.expected_at_least
        )
    }
}

/// Clamp a counted total to the rows already seen.
///
/// Returns the best-effort total and, when clamping happened, the anomaly to
/// report. The caller's operation still succeeds.
pub fn reconcile_total(
    window: Window,
    content_len: usize,
    counted: u64,
) -> (u64, Option<InconsistentTotal>) {
    let seen = window.offset().saturating_add(content_len as u64);
    if counted < seen {
        tracing::warn!(
            counted,
            expected_at_least = seen,
            "Inconsistent total: count query returned fewer rows than already read, clamping"
        );
        (
            seen,
            Some(InconsistentTotal {
                expected_at_least: seen,
                counted,
            }),
        )
    } else {
        (counted, None)
    }
}
