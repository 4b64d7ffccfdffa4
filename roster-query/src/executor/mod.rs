//! Query executors
//!
//! The executor is the relational store behind the repository. It receives a
//! fully composed [`ContentQuery`] or [`CountQuery`] and returns typed rows or
//! a scalar count; it never sees the search condition.
//!
//! - [`MemoryExecutor`]: in-process tables with left-join, ordering and
//!   windowing semantics matching SQL
//! - [`SqliteExecutor`]: renders queries to SQL and runs them through sqlx
//!   (requires the `sqlite` feature)
//! - [`CountingExecutor`]: wraps another executor and counts calls

use std::future::Future;

use crate::error::ExecutionError;
use crate::model::MemberTeamRow;
use crate::query::{ContentQuery, CountQuery};

mod counting;
mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use counting::CountingExecutor;
pub use memory::MemoryExecutor;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteExecutor;

/// A relational store able to run the composed member/team queries
///
/// # Example
///
/// ```rust,ignore
/// impl QueryExecutor for MyStore {
///     async fn fetch(&self, query: &ContentQuery<'_>) -> Result<Vec<MemberTeamRow>, ExecutionError> {
///         // Render query.predicates(), query.sort(), query.window() and run it
///         todo!()
///     }
///
///     async fn count(&self, query: &CountQuery<'_>) -> Result<u64, ExecutionError> {
///         todo!()
///     }
/// }
/// ```
pub trait QueryExecutor: Send + Sync {
    /// Rows matching the query, ordered and windowed as requested
    fn fetch(
        &self,
        query: &ContentQuery<'_>,
    ) -> impl Future<Output = Result<Vec<MemberTeamRow>, ExecutionError>> + Send;

    /// Number of rows matching the query's predicates over the same join
    fn count(
        &self,
        query: &CountQuery<'_>,
    ) -> impl Future<Output = Result<u64, ExecutionError>> + Send;
}
