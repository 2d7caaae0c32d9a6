use serde::{Deserialize, Serialize};

use crate::constants::limits::{DEFAULT_PAGE_SIZE, MAX_PAGE, MAX_PAGE_SIZE};

/// Page/limit pair after clamping. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    /// `page` is clamped to `1..=MAX_PAGE`; `limit` is clamped to `1..=100` and defaults to 20.
    #[must_use]
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.map_or(1, |p| u64::try_from(p.max(1)).unwrap_or(1).min(MAX_PAGE));
        let limit = limit.map_or(DEFAULT_PAGE_SIZE, |l| {
            u64::try_from(l.clamp(1, i64::try_from(MAX_PAGE_SIZE).unwrap_or(100)))
                .unwrap_or(DEFAULT_PAGE_SIZE)
        });
        Self { page, limit }
    }

    /// Zero-based page index as used by the database paginator.
    #[must_use]
    pub const fn index(&self) -> u64 {
        self.page - 1
    }

    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.index() * self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[must_use]
pub const fn total_pages(total: u64, limit: u64) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(limit)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            limit: request.limit,
            total_pages: total_pages(total, request.limit),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamping() {
        assert_eq!(PageRequest::new(None, None), PageRequest { page: 1, limit: 20 });
        assert_eq!(PageRequest::new(Some(0), Some(0)), PageRequest { page: 1, limit: 1 });
        assert_eq!(PageRequest::new(Some(-4), Some(500)), PageRequest { page: 1, limit: 100 });
        assert_eq!(PageRequest::new(Some(3), Some(25)).offset(), 50);
    }

    #[test]
    fn test_huge_page_is_capped() {
        let request = PageRequest::new(Some(i64::MAX), Some(100));
        assert_eq!(request.page, MAX_PAGE);
        assert_eq!(request.offset(), (MAX_PAGE - 1) * 100);
    }

    #[test]
    fn test_total_pages_is_ceiling() {
        for limit in 1..=30_u64 {
            for total in 0..=200_u64 {
                let pages = total_pages(total, limit);
                assert!(pages * limit >= total);
                if total > 0 {
                    assert!((pages - 1) * limit < total);
                } else {
                    assert_eq!(pages, 0);
                }
            }
        }
    }
}
