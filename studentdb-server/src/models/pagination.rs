//! Pagination types

use serde::{Deserialize, Serialize};

/// Maximum items per page
const MAX_LIMIT: u32 = 100;

/// Default items per page
const DEFAULT_LIMIT: u32 = 20;

/// Offset-based pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Rows to skip
    pub skip: u32,
    /// Rows to return (max 100)
    pub limit: u32,
}

impl Pagination {
    /// Create pagination with the limit clamped to 1..=100.
    pub fn new(skip: u32, limit: u32) -> Self {
        Self {
            skip,
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// SQL OFFSET value.
    pub fn offset(&self) -> i64 {
        i64::from(self.skip)
    }

    /// SQL LIMIT value.
    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    /// Total count across all pages
    pub total: i64,
    pub skip: u32,
    pub limit: u32,
}

impl<T> Paginated<T> {
    /// Check if rows remain after this page.
    pub fn has_next(&self) -> bool {
        i64::from(self.skip) + (self.items.len() as i64) < self.total
    }

    /// Convert every item, keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            skip: self.skip,
            limit: self.limit,
        }
    }
}

/// Query parameters for pagination.
///
/// Signed so that `?skip=-5` clamps instead of being rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl From<PaginationParams> for Pagination {
    fn from(params: PaginationParams) -> Self {
        let skip = params.skip.unwrap_or(0).clamp(0, i64::from(u32::MAX)) as u32;
        let limit = params
            .limit
            .unwrap_or(i64::from(DEFAULT_LIMIT))
            .clamp(1, i64::from(MAX_LIMIT)) as u32;
        Self::new(skip, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_limit() {
        assert_eq!(Pagination::new(0, 0).limit, 1);
        assert_eq!(Pagination::new(0, 999).limit, 100);
        assert_eq!(Pagination::new(40, 25).offset(), 40);
    }

    #[test]
    fn params_default_and_clamp() {
        let p = Pagination::from(PaginationParams::default());
        assert_eq!(p, Pagination { skip: 0, limit: 20 });

        let p = Pagination::from(PaginationParams {
            skip: Some(-5),
            limit: Some(-1),
        });
        assert_eq!(p, Pagination { skip: 0, limit: 1 });

        let p = Pagination::from(PaginationParams {
            skip: Some(30),
            limit: Some(5000),
        });
        assert_eq!(p, Pagination { skip: 30, limit: 100 });
    }

    #[test]
    fn has_next() {
        let page = Paginated {
            items: vec![1, 2, 3],
            total: 10,
            skip: 0,
            limit: 3,
        };
        assert!(page.has_next());

        let last = Paginated {
            items: vec![10],
            total: 10,
            skip: 9,
            limit: 3,
        };
        assert!(!last.has_next());
    }

    #[test]
    fn map_keeps_metadata() {
        let page = Paginated {
            items: vec![1, 2],
            total: 2,
            skip: 0,
            limit: 20,
        };
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.items, vec![10, 20]);
        assert_eq!(mapped.total, 2);
        assert_eq!(mapped.limit, 20);
    }
}
