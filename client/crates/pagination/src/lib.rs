//! Page-number pagination primitives.
//!
//! Purpose: describe where the last list request sits inside the full remote
//! result set and carry list responses in a uniform envelope.
//!
//! Public surface:
//! - [`Pagination`] — `{page, limit, total, pages}` state with its invariants.
//! - [`PaginationPatch`] — partial update merged into [`Pagination`].
//! - [`PageRequest`] — validated page/limit pair sent to a list endpoint.
//! - [`Page`] — list envelope pairing records with their [`Pagination`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of records requested per page.
pub const DEFAULT_LIMIT: u32 = 20;

/// Errors raised when a page request is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// Pages are 1-indexed.
    #[error("page must be at least 1")]
    ZeroPage,
    /// A page must hold at least one record.
    #[error("limit must be at least 1")]
    ZeroLimit,
}

/// Validated position requested from a list endpoint.
///
/// # Examples
/// ```
/// use pagination::PageRequest;
///
/// let request = PageRequest::new(2, 20).expect("valid request");
/// assert_eq!(request.offset(), 20);
/// assert!(PageRequest::new(0, 20).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Construct a request, rejecting zero pages or limits.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError`] when `page` or `limit` is zero.
    pub const fn new(page: u32, limit: u32) -> Result<Self, PageRequestError> {
        if page == 0 {
            return Err(PageRequestError::ZeroPage);
        }
        if limit == 0 {
            return Err(PageRequestError::ZeroLimit);
        }
        Ok(Self { page, limit })
    }

    /// First page with the given limit, falling back to [`DEFAULT_LIMIT`]
    /// when `limit` is zero.
    #[must_use]
    pub const fn first(limit: u32) -> Self {
        let limit = if limit == 0 { DEFAULT_LIMIT } else { limit };
        Self { page: 1, limit }
    }

    /// 1-indexed page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Records per page.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of records preceding this page in the full result set.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64).saturating_sub(1) * self.limit as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_LIMIT)
    }
}

/// Position of the last list response inside the remote result set.
///
/// ## Invariants
/// - `pages == ceil(total / limit)` when `limit > 0`, otherwise `0`.
/// - `page` is 1-indexed and never exceeds `max(pages, 1)`.
///
/// # Examples
/// ```
/// use pagination::Pagination;
///
/// let pagination = Pagination::from_response(1, 20, 45);
/// assert_eq!(pagination.pages(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(from = "PaginationDto", into = "PaginationDto")]
pub struct Pagination {
    page: u32,
    limit: u32,
    total: u64,
    pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::from_response(1, DEFAULT_LIMIT, 0)
    }
}

impl Pagination {
    /// Build pagination state from a list response.
    ///
    /// `pages` is always recomputed from `total` and `limit` so a server that
    /// reports an inconsistent page count cannot break the invariants, and
    /// `page` is clamped into `1..=max(pages, 1)`.
    #[must_use]
    pub fn from_response(page: u32, limit: u32, total: u64) -> Self {
        let mut pagination = Self {
            page,
            limit,
            total,
            pages: 0,
        };
        pagination.normalise();
        pagination
    }

    /// Current 1-indexed page.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Records per page.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Total records in the remote result set.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Number of pages in the remote result set.
    #[must_use]
    pub const fn pages(&self) -> u32 {
        self.pages
    }

    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.pages
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Page request describing the current position.
    #[must_use]
    pub const fn request(&self) -> PageRequest {
        let limit = if self.limit == 0 {
            DEFAULT_LIMIT
        } else {
            self.limit
        };
        let page = if self.page == 0 { 1 } else { self.page };
        PageRequest { page, limit }
    }

    /// Expected number of records on the current page.
    ///
    /// Equals `min(limit, total - (page - 1) * limit)`, or `0` when the
    /// current page starts beyond the end of the result set.
    #[must_use]
    pub fn expected_len(&self) -> u64 {
        let offset = self.request().offset();
        self.total
            .saturating_sub(offset)
            .min(u64::from(self.limit))
    }

    /// Account for one record created outside of a list request.
    pub fn increment_total(&mut self) {
        self.add_to_total(1);
    }

    /// Account for `count` records created outside of a list request.
    pub fn add_to_total(&mut self, count: u64) {
        self.total = self.total.saturating_add(count);
        self.normalise();
    }

    /// Account for one deleted record; the total never drops below zero.
    pub fn decrement_total(&mut self) {
        self.total = self.total.saturating_sub(1);
        self.normalise();
    }

    /// Move back to the first page.
    pub fn reset_page(&mut self) {
        self.page = 1;
    }

    /// Merge a partial update into the current state.
    ///
    /// Absent fields keep their value; `pages` is recomputed afterwards so the
    /// invariants hold regardless of the patch contents.
    pub fn apply(&mut self, patch: PaginationPatch) {
        if let Some(page) = patch.page {
            self.page = page;
        }
        if let Some(limit) = patch.limit {
            self.limit = limit;
        }
        if let Some(total) = patch.total {
            self.total = total;
        }
        self.normalise();
    }

    fn normalise(&mut self) {
        self.pages = if self.limit == 0 {
            0
        } else {
            let pages = self.total.div_ceil(u64::from(self.limit));
            u32::try_from(pages).unwrap_or(u32::MAX)
        };
        self.page = self.page.clamp(1, self.pages.max(1));
    }
}

/// Partial update for [`Pagination`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationPatch {
    /// New page, if changing.
    pub page: Option<u32>,
    /// New limit, if changing.
    pub limit: Option<u32>,
    /// New total, if changing.
    pub total: Option<u64>,
}

impl PaginationPatch {
    /// Patch that only moves to `page`.
    #[must_use]
    pub const fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            limit: None,
            total: None,
        }
    }

    /// Patch that only changes the page size.
    #[must_use]
    pub const fn limit(limit: u32) -> Self {
        Self {
            page: None,
            limit: Some(limit),
            total: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaginationDto {
    page: u32,
    limit: u32,
    total: u64,
    #[serde(default)]
    pages: u32,
}

impl From<PaginationDto> for Pagination {
    fn from(value: PaginationDto) -> Self {
        Self::from_response(value.page, value.limit, value.total)
    }
}

impl From<Pagination> for PaginationDto {
    fn from(value: Pagination) -> Self {
        Self {
            page: value.page,
            limit: value.limit,
            total: value.total,
            pages: value.pages,
        }
    }
}

/// List response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Records on this page, in server order.
    pub data: Vec<T>,
    /// Position of this page in the full result set.
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// Pair records with their pagination state.
    #[must_use]
    pub const fn new(data: Vec<T>, pagination: Pagination) -> Self {
        Self { data, pagination }
    }

    /// Transform every record while keeping the pagination state.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
