use crate::models::Pagination;
use serde::Deserialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 50;

/// Raw `?page=&limit=` values. Kept as strings so junk falls back to defaults
/// instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Page is clamped to at least 1 and limit to `1..=MAX_PAGE_SIZE`.
    pub fn from_query(query: &PageQuery) -> Self {
        let parse = |raw: &Option<String>, default: i64| {
            raw.as_deref()
                .and_then(|v| v.trim().parse::<i64>().ok())
                .unwrap_or(default)
        };

        Self {
            page: parse(&query.page, DEFAULT_PAGE).max(1),
            limit: parse(&query.limit, DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn pagination(&self, total: i64) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
            total,
            has_more: self.offset().saturating_add(self.limit) < total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, limit: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(String::from),
            limit: limit.map(String::from),
        }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(PageRequest::from_query(&PageQuery::default()), PageRequest::default());
        assert_eq!(
            PageRequest::from_query(&query(Some("abc"), Some(""))),
            PageRequest { page: 1, limit: 10 }
        );
    }

    #[test]
    fn test_clamping() {
        assert_eq!(
            PageRequest::from_query(&query(Some("-3"), Some("0"))),
            PageRequest { page: 1, limit: 1 }
        );
        assert_eq!(
            PageRequest::from_query(&query(Some("2"), Some("10000"))),
            PageRequest { page: 2, limit: MAX_PAGE_SIZE }
        );
    }

    #[test]
    fn test_has_more_boundaries() {
        // 25 posts, 10 per page: pages 1 and 2 have more, page 3 is last.
        let total = 25;
        let pages: Vec<bool> = (1..=3)
            .map(|page| PageRequest { page, limit: 10 }.pagination(total).has_more)
            .collect();
        assert_eq!(pages, vec![true, true, false]);

        // Exact multiple: the second of two full pages is last.
        assert!(!PageRequest { page: 2, limit: 10 }.pagination(20).has_more);
        assert!(!PageRequest { page: 1, limit: 10 }.pagination(0).has_more);
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest { page: 3, limit: 10 }.offset(), 20);
        assert_eq!(PageRequest { page: i64::MAX, limit: 50 }.offset(), i64::MAX);
    }
}
