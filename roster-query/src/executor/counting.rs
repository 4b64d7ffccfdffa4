//! Call-counting executor wrapper

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::ExecutionError;
use crate::model::MemberTeamRow;
use crate::query::{ContentQuery, CountQuery};

use super::QueryExecutor;

/// Wraps an executor and records how many content and count queries reached
/// it. Useful for asserting that the count query was elided.
#[derive(Debug, Default)]
pub struct CountingExecutor<E> {
    inner: E,
    fetch_calls: AtomicUsize,
    count_calls: AtomicUsize,
}

impl<E> CountingExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            fetch_calls: AtomicUsize::new(0),
            count_calls: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// Content queries executed so far
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Count queries executed so far
    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.fetch_calls.store(0, Ordering::SeqCst);
        self.count_calls.store(0, Ordering::SeqCst);
    }
}

impl<E: QueryExecutor> QueryExecutor for CountingExecutor<E> {
    async fn fetch(&self, query: &ContentQuery<'_>) -> Result<Vec<MemberTeamRow>, ExecutionError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(query).await
    }

    async fn count(&self, query: &CountQuery<'_>) -> Result<u64, ExecutionError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.count(query).await
    }
}
