use serde::Serialize;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Normalized page window. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        let page = page.map(i64::from).unwrap_or(1).max(1);
        let limit = limit
            .map(i64::from)
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Serialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> Paged<T> {
    pub fn new(items: Vec<T>, total: i64, window: Pagination) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + window.limit - 1) / window.limit
        };
        Self {
            items,
            total,
            page: window.page,
            limit: window.limit,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
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
    fn clamps_limit_and_page() {
        let p = Pagination::new(Some(0), Some(1000));
        assert_eq!(p, Pagination { page: 1, limit: MAX_LIMIT });
        assert_eq!(Pagination::new(None, Some(0)).limit, 1);
        assert_eq!(Pagination::new(Some(3), Some(20)).offset(), 40);
    }

    #[test]
    fn total_pages_rounds_up() {
        let window = Pagination::new(Some(1), Some(10));
        assert_eq!(Paged::new(Vec::<()>::new(), 0, window).total_pages, 0);
        assert_eq!(Paged::new(Vec::<()>::new(), 10, window).total_pages, 1);
        assert_eq!(Paged::new(Vec::<()>::new(), 11, window).total_pages, 2);
    }
}
