//! Member search repository
//!
//! Turns a [`MemberSearchCondition`] into a predicate set, composes the content
//! query over the member → team left join and, for paged reads, decides whether
//! the total-count query has to run at all.
//!
//! # Example
//!
//! ```rust
//! use roster_query::executor::MemoryExecutor;
//! use roster_query::page::PageRequest;
//! use roster_query::{MemberQueryRepository, MemberSearchCondition};
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let store = MemoryExecutor::new();
//! let team = store.insert_team("teamA").unwrap();
//! store.insert_member(Some("member1"), 10, Some(team.id)).unwrap();
//!
//! let repository = MemberQueryRepository::new(store);
//! let condition = MemberSearchCondition::new().team_name("teamA");
//! let page = repository
//!     .search_page(&condition, &PageRequest::first(20).unwrap())
//!     .await
//!     .unwrap();
//! assert_eq!(page.total(), 1);
//! # });
//! ```

use tracing::debug;

use crate::count::{plan_total, reconcile_total, TotalPlan};
use crate::error::{Error, Result};
use crate::executor::QueryExecutor;
use crate::model::{MemberSearchCondition, MemberTeamRow};
use crate::order::Sort;
use crate::page::{Page, PageRequest};
use crate::predicate::{has_text, username_eq, PredicateSet};
use crate::query::{fetch_content, ContentQuery, Window};

/// Read-side repository over members joined with their team
#[derive(Debug, Clone)]
pub struct MemberQueryRepository<E> {
    executor: E,
}

impl<E: QueryExecutor> MemberQueryRepository<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn into_inner(self) -> E {
        self.executor
    }

    /// Every member matching the condition. Row order is unspecified.
    pub async fn search(&self, condition: &MemberSearchCondition) -> Result<Vec<MemberTeamRow>> {
        self.search_sorted(condition, &Sort::unsorted()).await
    }

    /// Every member matching the condition, in the given order
    pub async fn search_sorted(
        &self,
        condition: &MemberSearchCondition,
        sort: &Sort,
    ) -> Result<Vec<MemberTeamRow>> {
        let predicates = PredicateSet::from_condition(condition);
        let query = ContentQuery::compose(&predicates, sort, None);
        fetch_content(&self.executor, &query).await
    }

    /// Members with exactly this username
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for a blank username, which would otherwise
    /// match everyone.
    pub async fn find_by_username(&self, username: &str) -> Result<Vec<MemberTeamRow>> {
        if !has_text(Some(username)) {
            return Err(Error::invalid_argument("username must not be blank"));
        }
        let predicates = PredicateSet::from_slots([username_eq(Some(username))]);
        let sort = Sort::unsorted();
        let query = ContentQuery::compose(&predicates, &sort, None);
        fetch_content(&self.executor, &query).await
    }

    /// One page of matching members plus the total.
    ///
    /// A first page that comes back shorter than the requested size is the
    /// whole result, so its length is the total and no count query runs.
    pub async fn search_page(
        &self,
        condition: &MemberSearchCondition,
        request: &PageRequest,
    ) -> Result<Page<MemberTeamRow>> {
        let predicates = PredicateSet::from_condition(condition);
        let window = request.window();
        let query = ContentQuery::compose(&predicates, request.sort(), Some(window));
        let content = fetch_content(&self.executor, &query).await?;

        match plan_total(window, content.len()) {
            TotalPlan::Known(total) => {
                debug!(total, "Short first page, count query skipped");
                Ok(Page::new(content, window, total))
            }
            TotalPlan::CountRequired => self.count_into_page(&query, window, content).await,
        }
    }

    /// One page of matching members plus the total, always running the count
    /// query.
    pub async fn search_page_simple(
        &self,
        condition: &MemberSearchCondition,
        request: &PageRequest,
    ) -> Result<Page<MemberTeamRow>> {
        let predicates = PredicateSet::from_condition(condition);
        let window = request.window();
        let query = ContentQuery::compose(&predicates, request.sort(), Some(window));
        let content = fetch_content(&self.executor, &query).await?;
        self.count_into_page(&query, window, content).await
    }

    async fn count_into_page(
        &self,
        query: &ContentQuery<'_>,
        window: Window,
        content: Vec<MemberTeamRow>,
    ) -> Result<Page<MemberTeamRow>> {
        debug!("Executing count query: where [{}]", query.predicates());
        let counted = self.executor.count(&query.count_query()).await?;
        let (total, inconsistency) = reconcile_total(window, content.len(), counted);
        Ok(Page::new(content, window, total).with_inconsistency(inconsistency))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::count::InconsistentTotal;
    use crate::error::{ExecutionError, ExecutionErrorKind, QueryOperation};
    use crate::executor::{CountingExecutor, MemoryExecutor};
    use crate::order::{NullsOrder, OrderSpec};
    use crate::predicate::{age_goe, age_loe, team_name_eq, Column};
    use crate::query::CountQuery;

    type Row = (Option<&'static str>, i32, Option<&'static str>);

    const ROSTER: &[Row] = &[
        (Some("member1"), 10, Some("teamA")),
        (Some("member2"), 20, Some("teamA")),
        (Some("member3"), 30, Some("teamB")),
        (Some("member4"), 40, Some("teamB")),
        (Some("loner"), 50, None),
    ];

    fn team_names(rows: &[Row]) -> Vec<&'static str> {
        let mut names = Vec::new();
        for name in rows.iter().filter_map(|r| r.2) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    fn memory_with(rows: &[Row]) -> MemberQueryRepository<CountingExecutor<MemoryExecutor>> {
        let store = MemoryExecutor::new();
        let teams: HashMap<_, _> = team_names(rows)
            .into_iter()
            .map(|name| (name, store.insert_team(name).unwrap().id))
            .collect();
        for (username, age, team) in rows {
            store
                .insert_member(*username, *age, team.map(|t| teams[t]))
                .unwrap();
        }
        MemberQueryRepository::new(CountingExecutor::new(store))
    }

    #[cfg(feature = "sqlite")]
    async fn sqlite_with(
        rows: &[Row],
    ) -> MemberQueryRepository<CountingExecutor<crate::executor::SqliteExecutor>> {
        use sqlx::sqlite::SqlitePoolOptions;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = crate::executor::SqliteExecutor::new(pool);
        store.migrate().await.unwrap();
        let mut teams = HashMap::new();
        for name in team_names(rows) {
            teams.insert(name, store.insert_team(name).await.unwrap().id);
        }
        for (username, age, team) in rows {
            store
                .insert_member(*username, *age, team.map(|t| teams[t]))
                .await
                .unwrap();
        }
        MemberQueryRepository::new(CountingExecutor::new(store))
    }

    /// `n` members in teamA with ages 0..n
    fn numbered(n: usize) -> Vec<Row> {
        let names: &'static [&'static str] = &[
            "m0", "m1", "m2", "m3", "m4", "m5", "m6", "m7", "m8", "m9", "m10", "m11",
        ];
        names[..n]
            .iter()
            .enumerate()
            .map(|(i, name)| (Some(*name), i as i32, Some("teamA")))
            .collect()
    }

    fn usernames(rows: &[MemberTeamRow]) -> Vec<Option<&str>> {
        rows.iter().map(|r| r.username.as_deref()).collect()
    }

    fn sorted_ids(rows: &[MemberTeamRow]) -> Vec<i64> {
        let mut ids: Vec<_> = rows.iter().map(|r| r.member_id).collect();
        ids.sort_unstable();
        ids
    }

    // Runs a scenario against the in-memory executor and, when enabled, SQLite.
    macro_rules! both_executors {
        ($rows:expr, $check:ident) => {{
            $check(memory_with($rows)).await;
            #[cfg(feature = "sqlite")]
            $check(sqlite_with($rows).await).await;
        }};
    }

    async fn check_all_absent_returns_everyone<E: QueryExecutor>(
        repo: MemberQueryRepository<CountingExecutor<E>>,
    ) {
        let rows = repo.search(&MemberSearchCondition::default()).await.unwrap();
        assert_eq!(rows.len(), 5);
        let loner = rows
            .iter()
            .find(|r| r.username.as_deref() == Some("loner"))
            .unwrap();
        assert!(loner.team_id.is_none());
        assert!(loner.team_name.is_none());
    }

    #[tokio::test]
    async fn test_all_absent_returns_everyone() {
        both_executors!(ROSTER, check_all_absent_returns_everyone);
    }

    async fn check_blank_username_is_absent<E: QueryExecutor>(
        repo: MemberQueryRepository<CountingExecutor<E>>,
    ) {
        let everyone = repo.search(&MemberSearchCondition::new()).await.unwrap();
        for blank in ["", "   ", "\t"] {
            let rows = repo
                .search(&MemberSearchCondition::new().username(blank))
                .await
                .unwrap();
            assert_eq!(sorted_ids(&rows), sorted_ids(&everyone));
        }
    }

    #[tokio::test]
    async fn test_blank_username_is_absent() {
        both_executors!(ROSTER, check_blank_username_is_absent);
    }

    async fn check_slot_order_is_irrelevant<E: QueryExecutor>(
        repo: MemberQueryRepository<CountingExecutor<E>>,
    ) {
        let sort = Sort::unsorted();
        let slots = [
            team_name_eq(Some("teamB")),
            age_goe(Some(25)),
            age_loe(Some(45)),
            None,
        ];
        let orders: [[usize; 4]; 4] = [[0, 1, 2, 3], [3, 2, 1, 0], [1, 3, 0, 2], [2, 0, 3, 1]];
        let mut results = Vec::new();
        for order in orders {
            let predicates = PredicateSet::from_slots(order.iter().map(|&i| slots[i].clone()));
            let query = ContentQuery::compose(&predicates, &sort, None);
            results.push(sorted_ids(&repo.executor().fetch(&query).await.unwrap()));
        }
        assert_eq!(results[0].len(), 2);
        assert!(results.iter().all(|r| r == &results[0]));
    }

    #[tokio::test]
    async fn test_slot_order_is_irrelevant() {
        both_executors!(ROSTER, check_slot_order_is_irrelevant);
    }

    async fn check_combined_condition<E: QueryExecutor>(
        repo: MemberQueryRepository<CountingExecutor<E>>,
    ) {
        let condition = MemberSearchCondition::new()
            .age_goe(35)
            .age_loe(40)
            .team_name("teamB");
        let rows = repo.search(&condition).await.unwrap();
        assert_eq!(usernames(&rows), vec![Some("member4")]);
        assert_eq!(rows[0].age, 40);
        assert_eq!(rows[0].team_name.as_deref(), Some("teamB"));
    }

    #[tokio::test]
    async fn test_combined_condition() {
        both_executors!(ROSTER, check_combined_condition);
    }

    async fn check_team_predicate_excludes_teamless<E: QueryExecutor>(
        repo: MemberQueryRepository<CountingExecutor<E>>,
    ) {
        let rows = repo
            .search(&MemberSearchCondition::new().team_name("teamA"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.team_name.as_deref() == Some("teamA")));
    }

    #[tokio::test]
    async fn test_team_predicate_excludes_teamless() {
        both_executors!(ROSTER, check_team_predicate_excludes_teamless);
    }

    const SAME_AGE: &[Row] = &[
        (Some("member5"), 100, None),
        (None, 100, None),
        (Some("member7"), 100, None),
        (Some("member6"), 100, None),
        (Some("member8"), 100, None),
    ];

    async fn check_nameless_sorts_last<E: QueryExecutor>(
        repo: MemberQueryRepository<CountingExecutor<E>>,
    ) {
        let sort = Sort::by(OrderSpec::desc(Column::Age, NullsOrder::Last))
            .then(OrderSpec::asc(Column::Username, NullsOrder::Last));
        let rows = repo
            .search_sorted(&MemberSearchCondition::new(), &sort)
            .await
            .unwrap();
        assert_eq!(
            usernames(&rows),
            vec![
                Some("member5"),
                Some("member6"),
                Some("member7"),
                Some("member8"),
                None
            ]
        );
    }

    #[tokio::test]
    async fn test_nameless_sorts_last() {
        both_executors!(SAME_AGE, check_nameless_sorts_last);
    }

    async fn check_short_first_page_skips_count<E: QueryExecutor>(
        repo: MemberQueryRepository<CountingExecutor<E>>,
    ) {
        let page = repo
            .search_page(&MemberSearchCondition::new(), &PageRequest::of(0, 10).unwrap())
            .await
            .unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(page.total(), 3);
        assert!(page.inconsistency().is_none());
        assert_eq!(repo.executor().fetch_calls(), 1);
        assert_eq!(repo.executor().count_calls(), 0);
    }

    #[tokio::test]
    async fn test_short_first_page_skips_count() {
        both_executors!(&numbered(3), check_short_first_page_skips_count);
    }

    async fn check_full_first_page_counts<E: QueryExecutor>(
        repo: MemberQueryRepository<CountingExecutor<E>>,
    ) {
        let page = repo
            .search_page(&MemberSearchCondition::new(), &PageRequest::of(0, 10).unwrap())
            .await
            .unwrap();
        assert_eq!(page.len(), 10);
        assert_eq!(page.total(), 12);
        assert_eq!(page.total_pages(), 2);
        assert!(page.has_next());
        assert_eq!(repo.executor().count_calls(), 1);
    }

    #[tokio::test]
    async fn test_full_first_page_counts() {
        both_executors!(&numbered(12), check_full_first_page_counts);
    }

    async fn check_exact_page_size_counts<E: QueryExecutor>(
        repo: MemberQueryRepository<CountingExecutor<E>>,
    ) {
        let page = repo
            .search_page(&MemberSearchCondition::new(), &PageRequest::of(0, 10).unwrap())
            .await
            .unwrap();
        assert_eq!(page.len(), 10);
        assert_eq!(page.total(), 10);
        assert!(page.is_last());
        assert_eq!(repo.executor().count_calls(), 1);
    }

    #[tokio::test]
    async fn test_exact_page_size_counts() {
        both_executors!(&numbered(10), check_exact_page_size_counts);
    }

    async fn check_later_page_counts<E: QueryExecutor>(
        repo: MemberQueryRepository<CountingExecutor<E>>,
    ) {
        let request = PageRequest::of(1, 10)
            .unwrap()
            .with_sort(Sort::by(OrderSpec::asc(Column::Age, NullsOrder::Last)));
        let page = repo
            .search_page(&MemberSearchCondition::new(), &request)
            .await
            .unwrap();
        assert_eq!(usernames(page.content()), vec![Some("m10"), Some("m11")]);
        assert_eq!(page.total(), 12);
        assert!(page.is_last());
        assert!(page.has_previous());
        assert_eq!(repo.executor().count_calls(), 1);

        let beyond = repo
            .search_page(&MemberSearchCondition::new(), &PageRequest::of(5, 10).unwrap())
            .await
            .unwrap();
        assert!(beyond.is_empty());
        assert_eq!(beyond.total(), 12);
        assert_eq!(repo.executor().count_calls(), 2);
    }

    #[tokio::test]
    async fn test_later_page_counts() {
        both_executors!(&numbered(12), check_later_page_counts);
    }

    async fn check_zero_limit_skips_content<E: QueryExecutor>(
        repo: MemberQueryRepository<CountingExecutor<E>>,
    ) {
        let page = repo
            .search_page(
                &MemberSearchCondition::new(),
                &PageRequest::offset_limit(0, 0).unwrap(),
            )
            .await
            .unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total(), 12);
        assert_eq!(repo.executor().fetch_calls(), 0);
        assert_eq!(repo.executor().count_calls(), 1);
    }

    #[tokio::test]
    async fn test_zero_limit_skips_content() {
        both_executors!(&numbered(12), check_zero_limit_skips_content);
    }

    async fn check_simple_page_always_counts<E: QueryExecutor>(
        repo: MemberQueryRepository<CountingExecutor<E>>,
    ) {
        let page = repo
            .search_page_simple(&MemberSearchCondition::new(), &PageRequest::of(0, 10).unwrap())
            .await
            .unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(page.total(), 3);
        assert_eq!(repo.executor().count_calls(), 1);
    }

    #[tokio::test]
    async fn test_simple_page_always_counts() {
        both_executors!(&numbered(3), check_simple_page_always_counts);
    }

    async fn check_find_by_username<E: QueryExecutor>(
        repo: MemberQueryRepository<CountingExecutor<E>>,
    ) {
        let rows = repo.find_by_username("member3").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].team_name.as_deref(), Some("teamB"));
        assert!(repo.find_by_username("nobody").await.unwrap().is_empty());

        let err = repo.find_by_username("  ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(repo.executor().fetch_calls(), 2);
    }

    #[tokio::test]
    async fn test_find_by_username() {
        both_executors!(ROSTER, check_find_by_username);
    }

    #[test]
    fn test_negative_offset_rejected_before_execution() {
        let err = PageRequest::offset_limit(-1, 10).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    /// Reports fewer rows than exist, as if rows vanished between the reads
    struct ShrinkingCount {
        inner: MemoryExecutor,
        missing: u64,
    }

    impl QueryExecutor for ShrinkingCount {
        async fn fetch(
            &self,
            query: &ContentQuery<'_>,
        ) -> std::result::Result<Vec<MemberTeamRow>, ExecutionError> {
            self.inner.fetch(query).await
        }

        async fn count(&self, query: &CountQuery<'_>) -> std::result::Result<u64, ExecutionError> {
            let total = self.inner.count(query).await?;
            Ok(total.saturating_sub(self.missing))
        }
    }

    #[tokio::test]
    async fn test_inconsistent_total_is_clamped_and_reported() {
        let inner = MemoryExecutor::new();
        for i in 0..12 {
            inner.insert_member(Some(&format!("m{}", i)), i, None).unwrap();
        }
        let repo = MemberQueryRepository::new(ShrinkingCount { inner, missing: 5 });

        let page = repo
            .search_page(&MemberSearchCondition::new(), &PageRequest::of(0, 10).unwrap())
            .await
            .unwrap();
        assert_eq!(page.len(), 10);
        assert_eq!(page.total(), 10);
        assert_eq!(
            page.inconsistency(),
            Some(&InconsistentTotal {
                expected_at_least: 10,
                counted: 7,
            })
        );
    }

    /// Content reads succeed; count reads fail
    struct FailingCount(MemoryExecutor);

    impl QueryExecutor for FailingCount {
        async fn fetch(
            &self,
            query: &ContentQuery<'_>,
        ) -> std::result::Result<Vec<MemberTeamRow>, ExecutionError> {
            self.0.fetch(query).await
        }

        async fn count(&self, _query: &CountQuery<'_>) -> std::result::Result<u64, ExecutionError> {
            Err(ExecutionError::new(
                QueryOperation::Count,
                ExecutionErrorKind::Timeout,
                "statement timeout",
            ))
        }
    }

    #[tokio::test]
    async fn test_count_failure_propagates_unchanged() {
        let store = MemoryExecutor::new();
        for i in 0..3 {
            store.insert_member(Some(&format!("m{}", i)), i, None).unwrap();
        }
        let repo = MemberQueryRepository::new(FailingCount(store));
        let request = PageRequest::of(0, 2).unwrap();

        let err = repo
            .search_page(&MemberSearchCondition::new(), &request)
            .await
            .unwrap_err();
        let execution = err.as_execution().unwrap();
        assert_eq!(execution.operation, QueryOperation::Count);
        assert_eq!(execution.kind, ExecutionErrorKind::Timeout);
        assert!(execution.is_retriable());

        // A short first page never reaches the failing count
        let page = repo
            .search_page(&MemberSearchCondition::new(), &PageRequest::of(0, 10).unwrap())
            .await
            .unwrap();
        assert_eq!(page.total(), 3);
    }
}
