//! Paged search request and result
//!
//! A [`PageRequest`] carries the 1-indexed page, page size and ordering of a
//! paged search. The answer comes back as a [`PagedSearchResult`]:
//!
//! ```rust
//! use acton_store::PagedSearchResult;
//!
//! let result = PagedSearchResult::new(25, 10, 2, vec!["k"; 10]);
//! assert_eq!(result.last_page, 3);
//! assert_eq!(result.from, 11);
//! assert_eq!(result.to, 20);
//! ```

use serde::{Deserialize, Serialize};

/// Page, page size and ordering for a paged search
///
/// `order_by` is a comma-separated column list; `sort` is a comma-separated
/// list of directions paired with it by position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number, 1-indexed; zero or less means the first page
    #[serde(default)]
    pub page: i64,

    /// Rows per page; zero or less means the store default
    #[serde(default)]
    pub rows: i64,

    /// Columns to order by, e.g. `"name,age"`
    #[serde(default)]
    pub order_by: String,

    /// Directions for `order_by`, e.g. `"desc,asc"`
    #[serde(default)]
    pub sort: String,
}

impl PageRequest {
    /// First page at the store's default size, unordered
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page number
    ///
    /// ```rust
    /// use acton_store::PageRequest;
    ///
    /// assert_eq!(PageRequest::new().with_page(3).page_number(), 3);
    /// assert_eq!(PageRequest::new().with_page(-2).page_number(), 1);
    /// ```
    #[must_use]
    pub fn with_page(mut self, page: i64) -> Self {
        self.page = page;
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_rows(mut self, rows: i64) -> Self {
        self.rows = rows;
        self
    }

    /// Set the order columns and their directions
    #[must_use]
    pub fn with_order(mut self, order_by: impl Into<String>, sort: impl Into<String>) -> Self {
        self.order_by = order_by.into();
        self.sort = sort.into();
        self
    }

    /// Page number with the first-page fallback applied
    #[must_use]
    pub fn page_number(&self) -> i64 {
        self.page.max(1)
    }

    /// Page size, or `default_rows` when none was asked for
    #[must_use]
    pub fn rows_per_page(&self, default_rows: i64) -> i64 {
        if self.rows > 0 {
            self.rows
        } else {
            default_rows
        }
    }

    /// Rows to skip before the requested page
    #[must_use]
    pub fn offset(&self, default_rows: i64) -> i64 {
        (self.page_number() - 1).saturating_mul(self.rows_per_page(default_rows))
    }
}

/// One page of search results with its paging metadata
///
/// `from` and `to` are 1-indexed and inclusive. `to` always spans a full page,
/// so on the last page it can exceed `total_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedSearchResult<T> {
    /// Rows matching the filter, across all pages
    pub total_data: i64,
    /// Page size
    pub rows: i64,
    /// Page number, 1-indexed
    pub current_page: i64,
    /// Number of the last page; zero when nothing matched
    pub last_page: i64,
    /// Position of the first row of this page
    pub from: i64,
    /// Position of the last row of a full page
    pub to: i64,
    /// Rows on this page
    pub data: Vec<T>,
}

impl<T> PagedSearchResult<T> {
    /// Build the paging metadata for `data`
    pub fn new(total_data: i64, rows: i64, current_page: i64, data: Vec<T>) -> Self {
        let last_page = if rows > 0 {
            total_data / rows + i64::from(total_data % rows != 0)
        } else {
            0
        };
        let from = (current_page - 1).saturating_mul(rows).saturating_add(1);
        let to = from.saturating_add(rows.saturating_sub(1));

        Self {
            total_data,
            rows,
            current_page,
            last_page,
            from,
            to,
            data,
        }
    }

    /// Whether this page holds no rows
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Convert the rows while keeping the paging metadata
    pub fn map<U, F>(self, f: F) -> PagedSearchResult<U>
    where
        F: FnMut(T) -> U,
    {
        PagedSearchResult {
            total_data: self.total_data,
            rows: self.rows,
            current_page: self.current_page,
            last_page: self.last_page,
            from: self.from,
            to: self.to,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}
