//! # roster-query
//!
//! Dynamic member/team search over a relational store, with pagination that
//! skips the total-count query whenever the page already proves the total.
//!
//! ## Features
//!
//! - **Sparse conditions**: every field of a [`MemberSearchCondition`] is
//!   optional; absent or blank fields contribute no predicate
//! - **Left join**: members are always joined to their optional team, so
//!   members without a team are returned unless a team predicate excludes them
//! - **Explicit ordering**: each ordering item states its null placement
//! - **Count elision**: a short first page is the whole result set and needs no
//!   count query
//! - **Executors**: in-memory tables or SQLite through sqlx (`sqlite` feature)
//!
//! ## Example
//!
//! ```rust,no_run
//! use roster_query::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config);
//!
//!     let pool = create_pool(&config.database).await?;
//!     let store = SqliteExecutor::new(pool);
//!     store.migrate().await?;
//!
//!     let repository = MemberQueryRepository::new(store);
//!     let condition = MemberSearchCondition::new().team_name("teamB").age_goe(35);
//!     let request = PageRequest::first(config.paging.default_page_size)?
//!         .with_sort(Sort::by(OrderSpec::desc(Column::Age, NullsOrder::Last)));
//!
//!     let page = repository.search_page(&condition, &request).await?;
//!     println!("{} of {} members", page.len(), page.total());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod count;
pub mod error;
pub mod executor;
pub mod model;
pub mod observability;
pub mod order;
pub mod page;
pub mod predicate;
pub mod query;
pub mod repository;
pub mod seed;

#[cfg(feature = "sqlite")]
pub mod database;

pub use error::{Error, Result};
pub use model::{Member, MemberSearchCondition, MemberTeamRow, Team};
pub use repository::MemberQueryRepository;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, DatabaseConfig, PagingConfig, ServiceConfig};
    pub use crate::count::{plan_total, reconcile_total, InconsistentTotal, TotalPlan};
    pub use crate::error::{
        Error, ExecutionError, ExecutionErrorKind, QueryOperation, Result,
    };
    pub use crate::executor::{CountingExecutor, MemoryExecutor, QueryExecutor};
    pub use crate::model::{Member, MemberSearchCondition, MemberTeamRow, Team};
    pub use crate::observability::init_tracing;
    pub use crate::order::{NullsOrder, OrderDirection, OrderSpec, Sort};
    pub use crate::page::{Page, PageRequest};
    pub use crate::predicate::{Column, Comparison, Predicate, PredicateSet, Value};
    pub use crate::query::{ContentQuery, CountQuery, Window};
    pub use crate::repository::MemberQueryRepository;

    #[cfg(feature = "sqlite")]
    pub use crate::database::create_pool;

    #[cfg(feature = "sqlite")]
    pub use crate::executor::SqliteExecutor;
}
