//! Offset pagination over filtered, ordered result sets.

use serde::Serialize;

use crate::error::CoreError;

/// A validated page request. `page` is zero-indexed; construction rejects
/// anything a query could not honor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    page_size: i64,
}

impl PageRequest {
    pub fn new(page: i64, page_size: i64) -> Result<Self, CoreError> {
        if page < 0 {
            return Err(CoreError::invalid(
                "page",
                format!("must be >= 0, got {page}"),
            ));
        }
        if page_size <= 0 {
            return Err(CoreError::invalid(
                "pageSize",
                format!("must be >= 1, got {page_size}"),
            ));
        }
        Ok(PageRequest { page, page_size })
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> i64 {
        self.page * self.page_size
    }

    /// Rows to fetch: one past the page size, so a next page is observed
    /// directly instead of inferred from a separate count.
    pub fn fetch_limit(&self) -> i64 {
        self.page_size + 1
    }

    /// True for page zero, the only page that carries a total count.
    pub fn is_first(&self) -> bool {
        self.page == 0
    }

    /// Split a fetched batch into the page items and the has-next flag.
    pub fn take_page<T>(&self, mut rows: Vec<T>) -> (Vec<T>, bool) {
        let has_next = rows.len() as i64 > self.page_size;
        rows.truncate(self.page_size as usize);
        (rows, has_next)
    }
}

/// One page of results plus paging metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_next_page: bool,
    /// Total matching rows. Computed for the first page only and not
    /// refreshed while later pages are walked, so it is a snapshot of the
    /// moment the listing started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative_page() {
        let err = PageRequest::new(-1, 20).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_rejects_non_positive_page_size() {
        assert!(PageRequest::new(0, 0).unwrap_err().is_invalid_input());
        assert!(PageRequest::new(0, -5).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_offset_and_limit() {
        let first = PageRequest::new(0, 20).unwrap();
        assert_eq!(first.offset(), 0);
        assert_eq!(first.fetch_limit(), 21);
        assert!(first.is_first());

        let fourth = PageRequest::new(3, 25).unwrap();
        assert_eq!(fourth.offset(), 75);
        assert_eq!(fourth.fetch_limit(), 26);
        assert!(!fourth.is_first());
    }

    #[test]
    fn test_take_page_detects_next_page() {
        let req = PageRequest::new(0, 3).unwrap();

        let (items, has_next) = req.take_page(vec![1, 2, 3, 4]);
        assert_eq!(items, vec![1, 2, 3]);
        assert!(has_next);

        let (items, has_next) = req.take_page(vec![1, 2, 3]);
        assert_eq!(items, vec![1, 2, 3]);
        assert!(!has_next);

        let (items, has_next) = req.take_page(Vec::<i32>::new());
        assert!(items.is_empty());
        assert!(!has_next);
    }

    #[test]
    fn test_total_count_serialized_only_when_present() {
        let with_total = Page {
            items: vec![1],
            has_next_page: false,
            total_count: Some(1),
        };
        let json = serde_json::to_string(&with_total).unwrap();
        assert!(json.contains("\"totalCount\":1"));

        let without_total = Page {
            items: vec![1],
            has_next_page: true,
            total_count: None,
        };
        let json = serde_json::to_string(&without_total).unwrap();
        assert!(!json.contains("totalCount"));
        assert!(json.contains("\"hasNextPage\":true"));
    }
}
