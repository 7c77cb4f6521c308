//! Page-number pagination for list endpoints.

use serde::{Deserialize, Serialize};

/// Items per page on paginated endpoints.
pub const PAGE_SIZE: i64 = 24;

/// `?page=N` query parameter.
///
/// Kept as a string so a malformed value falls back to the first page
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// One-based page number (at least 1).
    #[must_use]
    pub fn number(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1)
    }

    /// SQL `LIMIT`.
    #[must_use]
    pub const fn limit(&self) -> i64 {
        PAGE_SIZE
    }

    /// SQL `OFFSET`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.number() - 1).saturating_mul(PAGE_SIZE)
    }
}

/// A page of results with neighbour page numbers.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Build a page from one slice of results and the total row count.
    #[must_use]
    pub fn new(results: Vec<T>, count: i64, query: &PageQuery) -> Self {
        let number = query.number();
        let next = (number.saturating_mul(PAGE_SIZE) < count).then_some(number + 1);
        let previous = (number > 1).then_some(number - 1);
        Self {
            count,
            next,
            previous,
            results,
        }
    }

    /// Single page holding everything (for callers with nothing to page).
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }

    /// Convert the results while keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: &str) -> PageQuery {
        PageQuery {
            page: Some(page.to_owned()),
        }
    }

    #[test]
    fn test_page_number_parsing() {
        assert_eq!(PageQuery::default().number(), 1);
        assert_eq!(query("3").number(), 3);
        assert_eq!(query("0").number(), 1);
        assert_eq!(query("-2").number(), 1);
        assert_eq!(query("abc").number(), 1);
        assert_eq!(query("2").offset(), 24);
    }

    #[test]
    fn test_page_links() {
        let first = Page::new(vec![1, 2], 50, &query("1"));
        assert_eq!(first.next, Some(2));
        assert_eq!(first.previous, None);

        let last = Page::new(vec![1, 2], 50, &query("3"));
        assert_eq!(last.next, None);
        assert_eq!(last.previous, Some(2));

        let exact = Page::new(vec![0; 24], 24, &query("1"));
        assert_eq!(exact.next, None);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = Page::new(vec![1, 2], 30, &query("1")).map(|n| n * 10);
        assert_eq!(page.results, vec![10, 20]);
        assert_eq!(page.count, 30);
        assert_eq!(page.next, Some(2));
    }
}
