//! Pagination utilities for list endpoints

use serde::Serialize;

use crate::error::ApiError;

/// Fixed page size for MSME listings.
pub const MSME_PAGE_SIZE: i64 = 15;

/// Validate a 1-based page number from the query string.
///
/// Missing defaults to page 1; zero or negative values are a client error.
pub fn validate_page(page: Option<i64>) -> Result<i64, ApiError> {
    match page {
        None => Ok(1),
        Some(p) if p >= 1 => Ok(p),
        Some(p) => Err(ApiError::bad_request(format!(
            "page must be a positive integer, got {}",
            p
        ))),
    }
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total_items: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PageMeta {
    pub fn new(page: i64, page_size: i64, total_items: i64) -> Self {
        let total_pages = if total_items == 0 {
            0
        } else {
            (total_items + page_size - 1) / page_size
        };

        Self {
            total_items,
            total_pages,
            has_next_page: page < total_pages,
            has_previous_page: page > 1,
        }
    }

    /// SQL OFFSET for a 1-based page.
    pub fn offset(page: i64, page_size: i64) -> i64 {
        (page - 1) * page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_to_one() {
        assert_eq!(validate_page(None).unwrap(), 1);
        assert_eq!(validate_page(Some(3)).unwrap(), 3);
    }

    #[test]
    fn zero_and_negative_pages_are_rejected() {
        assert!(validate_page(Some(0)).is_err());
        assert!(validate_page(Some(-2)).is_err());
    }

    #[test]
    fn meta_for_empty_table() {
        let meta = PageMeta::new(1, MSME_PAGE_SIZE, 0);
        assert_eq!(meta.total_items, 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next_page);
        assert!(!meta.has_previous_page);
    }

    #[test]
    fn meta_past_the_last_page() {
        // 20 items at 15 per page -> 2 pages; page 5 is past the end
        let meta = PageMeta::new(5, MSME_PAGE_SIZE, 20);
        assert_eq!(meta.total_pages, 2);
        assert!(!meta.has_next_page);
        assert!(meta.has_previous_page);
    }

    #[test]
    fn meta_counts_partial_pages() {
        let meta = PageMeta::new(1, MSME_PAGE_SIZE, 16);
        assert_eq!(meta.total_pages, 2);
        assert!(meta.has_next_page);
        assert!(!meta.has_previous_page);
    }

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(PageMeta::offset(1, MSME_PAGE_SIZE), 0);
        assert_eq!(PageMeta::offset(3, MSME_PAGE_SIZE), 30);
    }
}
