//! Page requests and assembled pages
//!
//! # Example
//!
//! ```rust
//! use roster_query::page::{Page, PageRequest};
//!
//! // Third page (zero-based index 2) of 20 rows
//! let request = PageRequest::of(2, 20).unwrap();
//! assert_eq!(request.offset(), 40);
//! assert_eq!(request.limit(), 20);
//!
//! let page = Page::new(vec!["a", "b"], request.window(), 42);
//! assert_eq!(page.total_pages(), 3);
//! assert!(page.is_last());
//! ```

use serde::Serialize;

use crate::count::InconsistentTotal;
use crate::error::{Error, Result};
use crate::order::Sort;
use crate::query::Window;

/// What to fetch: an offset/limit window plus an explicit ordering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    window: Window,
    sort: Sort,
}

impl PageRequest {
    /// Zero-based page index and a positive page size
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for a negative page, a size that is not
    /// positive, or an offset that overflows.
    pub fn of(page: i64, size: i64) -> Result<Self> {
        if page < 0 {
            return Err(Error::invalid_argument(format!(
                "page index must not be negative, got {}",
                page
            )));
        }
        if size <= 0 {
            return Err(Error::invalid_argument(format!(
                "page size must be positive, got {}",
                size
            )));
        }
        let offset = page.checked_mul(size).ok_or_else(|| {
            Error::invalid_argument(format!("page {} of size {} overflows", page, size))
        })?;
        Self::offset_limit(offset, size)
    }

    /// First page of the given positive size
    pub fn first(size: i64) -> Result<Self> {
        Self::of(0, size)
    }

    /// Raw offset/limit. A zero limit is allowed and yields an empty page.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when either value is negative.
    pub fn offset_limit(offset: i64, limit: i64) -> Result<Self> {
        Ok(Self {
            window: Window::new(offset, limit)?,
            sort: Sort::unsorted(),
        })
    }

    /// Replace the ordering
    #[must_use]
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    pub fn offset(&self) -> u64 {
        self.window.offset()
    }

    pub fn limit(&self) -> u64 {
        self.window.limit()
    }

    /// Zero-based page index implied by offset and limit
    pub fn page_number(&self) -> u64 {
        page_number(self.window)
    }

    /// Request for the following page, same size and ordering
    #[must_use]
    pub fn next(&self) -> Self {
        let offset = self.offset().saturating_add(self.limit());
        Self {
            window: Window::from_parts(offset, self.limit()),
            sort: self.sort.clone(),
        }
    }

    /// Request for the preceding page, or the first page when already there
    #[must_use]
    pub fn previous_or_first(&self) -> Self {
        let offset = self.offset().saturating_sub(self.limit());
        Self {
            window: Window::from_parts(offset, self.limit()),
            sort: self.sort.clone(),
        }
    }
}

/// A bounded slice of an ordered result set plus its total element count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    content: Vec<T>,
    window: Window,
    total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    inconsistency: Option<InconsistentTotal>,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, window: Window, total: u64) -> Self {
        Self {
            content,
            window,
            total,
            inconsistency: None,
        }
    }

    /// Attach the anomaly found while reconciling the total
    #[must_use]
    pub fn with_inconsistency(mut self, inconsistency: Option<InconsistentTotal>) -> Self {
        self.inconsistency = inconsistency;
        self
    }

    /// Rows in query order
    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    /// Number of rows on this page
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn offset(&self) -> u64 {
        self.window.offset()
    }

    pub fn limit(&self) -> u64 {
        self.window.limit()
    }

    /// Total matching rows. Exact unless [`Page::inconsistency`] is set, in
    /// which case it is a lower bound.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Set when the count query contradicted the content read
    pub fn inconsistency(&self) -> Option<&InconsistentTotal> {
        self.inconsistency.as_ref()
    }

    pub fn page_number(&self) -> u64 {
        page_number(self.window)
    }

    /// Number of pages of this size; a zero-size page counts as one page
    pub fn total_pages(&self) -> u64 {
        if self.limit() == 0 {
            1
        } else {
            self.total.div_ceil(self.limit())
        }
    }

    pub fn has_next(&self) -> bool {
        self.page_number() + 1 < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.offset() > 0
    }

    pub fn is_first(&self) -> bool {
        !self.has_previous()
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    /// Convert the rows, keeping window and total
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            window: self.window,
            total: self.total,
            inconsistency: self.inconsistency,
        }
    }
}

fn page_number(window: Window) -> u64 {
    if window.limit() == 0 {
        0
    } else {
        window.offset() / window.limit()
    }
}
