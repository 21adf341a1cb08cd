//! Pagination query parameters.

use serde::Deserialize;

use verdant_core::types::pagination::PageRequest;

/// Pagination query parameters, e.g. `?page=2&page_size=50`.
///
/// Kept separate from [`PageRequest`] so query strings can omit either
/// field; out-of-range values are clamped, never rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    /// Page number (1-based).
    pub page: Option<u64>,
    /// Items per page.
    pub page_size: Option<u64>,
}

impl PaginationParams {
    /// Converts to a clamped [`PageRequest`].
    pub fn into_page_request(self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.page_size.unwrap_or(defaults.page_size),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let page = PaginationParams::default().into_page_request();
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, PageRequest::default().page_size);
    }

    #[test]
    fn oversized_pages_are_clamped() {
        let params = PaginationParams {
            page: Some(0),
            page_size: Some(10_000),
        };
        let page = params.into_page_request();
        assert_eq!(page.page, 1);
        assert!(page.page_size <= 100);
    }
}
