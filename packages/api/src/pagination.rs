//! Limit/offset pagination for list endpoints.
//!
//! Pagination is opt-in: a list is paged only when the client passes a
//! positive integer `limit`. The paged response is wrapped in a
//! [`Paginated`] envelope; otherwise the list is returned as a bare array.

use serde::{Deserialize, Serialize};

/// Raw `?limit=&offset=` query parameters.
///
/// Kept as strings so malformed values can fall back to defaults instead of
/// rejecting the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LimitOffsetQuery {
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub offset: Option<String>,
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: u64,
    pub offset: u64,
}

impl LimitOffsetQuery {
    /// The requested window, or `None` when the list should not be paged.
    ///
    /// `limit` must parse as an integer greater than zero. `offset` defaults
    /// to `0` when absent, negative or not a number.
    pub fn window(&self) -> Option<PageWindow> {
        let limit = self
            .limit
            .as_deref()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|&n| n > 0)?;
        let offset = self
            .offset
            .as_deref()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(0);
        Some(PageWindow { limit, offset })
    }
}

/// Paged list envelope.
///
/// ```json
/// { "count": 7, "next": "http://host/api/v1/posts/?limit=2&offset=2",
///   "previous": null, "results": [ ... ] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paginated<T> {
    /// Total number of items across all pages.
    pub count: u64,
    /// Absolute URL of the next page; `null` on the last page.
    pub next: Option<String>,
    /// Absolute URL of the previous page; `null` on the first page.
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    /// Wrap one page of `results`.
    ///
    /// `page_url` is the absolute URL of the list without a query string;
    /// navigation links are built by appending `limit`/`offset` to it.
    pub fn new(results: Vec<T>, count: u64, window: PageWindow, page_url: &str) -> Self {
        let PageWindow { limit, offset } = window;

        let next = (offset.saturating_add(limit) < count)
            .then(|| format!("{page_url}?limit={limit}&offset={}", offset + limit));

        let previous = if offset == 0 {
            None
        } else if offset <= limit {
            Some(format!("{page_url}?limit={limit}"))
        } else {
            Some(format!("{page_url}?limit={limit}&offset={}", offset - limit))
        };

        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://testserver/api/v1/posts/";

    fn query(limit: Option<&str>, offset: Option<&str>) -> LimitOffsetQuery {
        LimitOffsetQuery {
            limit: limit.map(str::to_string),
            offset: offset.map(str::to_string),
        }
    }

    #[test]
    fn no_limit_means_unpaged() {
        assert_eq!(query(None, Some("3")).window(), None);
        assert_eq!(query(Some("0"), None).window(), None);
        assert_eq!(query(Some("-1"), None).window(), None);
        assert_eq!(query(Some("two"), None).window(), None);
    }

    #[test]
    fn bad_offset_falls_back_to_zero() {
        assert_eq!(
            query(Some("2"), Some("x")).window(),
            Some(PageWindow { limit: 2, offset: 0 })
        );
        assert_eq!(
            query(Some("2"), Some("-4")).window(),
            Some(PageWindow { limit: 2, offset: 0 })
        );
        assert_eq!(
            query(Some("5"), Some("10")).window(),
            Some(PageWindow { limit: 5, offset: 10 })
        );
    }

    #[test]
    fn first_page_links() {
        let page = Paginated::new(vec![1, 2], 5, PageWindow { limit: 2, offset: 0 }, URL);
        assert_eq!(page.count, 5);
        assert_eq!(
            page.next.as_deref(),
            Some("http://testserver/api/v1/posts/?limit=2&offset=2")
        );
        assert_eq!(page.previous, None);
    }

    #[test]
    fn middle_and_last_page_links() {
        let middle = Paginated::new(vec![3, 4], 5, PageWindow { limit: 2, offset: 2 }, URL);
        assert_eq!(
            middle.previous.as_deref(),
            Some("http://testserver/api/v1/posts/?limit=2")
        );
        assert_eq!(
            middle.next.as_deref(),
            Some("http://testserver/api/v1/posts/?limit=2&offset=4")
        );

        let last = Paginated::new(vec![5], 5, PageWindow { limit: 2, offset: 4 }, URL);
        assert_eq!(last.next, None);
        assert_eq!(
            last.previous.as_deref(),
            Some("http://testserver/api/v1/posts/?limit=2&offset=2")
        );
    }
}
