//! Page arithmetic shared by every paginated listing.

use serde::Serialize;

/// A clamped page within a result set of `total_rows` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub number: i64,
    pub size: i64,
    pub total_rows: i64,
    pub total_pages: i64,
}

impl Page {
    /// `total_pages` is `ceil(total_rows / size)`, zero for an empty set.
    /// The requested page is clamped to `[1, total_pages]`; an empty set
    /// still reports page 1 so callers can render "no results".
    pub fn new(total_rows: i64, size: i64, requested: i64) -> Self {
        let size = size.max(1);
        let total_rows = total_rows.max(0);
        let total_pages = if total_rows == 0 {
            0
        } else {
            (total_rows - 1) / size + 1
        };
        let number = requested.min(total_pages).max(1);
        Self {
            number,
            size,
            total_rows,
            total_pages,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.size
    }

    pub fn limit(&self) -> i64 {
        self.size
    }

    pub fn has_prev(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }
}

/// One page of rows plus the page it was cut from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub page: Page,
}

impl<T> Listing<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_page_past_end_clamps_to_last() {
        let page = Page::new(23, 5, 10);
        assert_eq!(page.total_pages, 5);
        assert_eq!(page.number, 5);
        assert_eq!(page.offset(), 20);
        // rows 21..=23 remain on the last page
        assert_eq!(page.total_rows - page.offset(), 3);
        assert!(!page.has_next());
        assert!(page.has_prev());
    }

    #[test]
    fn empty_set_has_zero_pages_and_offset_zero() {
        let page = Page::new(0, 5, 3);
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.number, 1);
        assert_eq!(page.offset(), 0);
        assert!(!page.has_next());
        assert!(!page.has_prev());
    }

    #[test]
    fn zero_and_negative_requests_clamp_to_first() {
        assert_eq!(Page::new(12, 5, 0).number, 1);
        assert_eq!(Page::new(12, 5, -4).number, 1);
    }

    #[test]
    fn exact_multiple_does_not_add_a_page() {
        let page = Page::new(10, 5, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.offset(), 5);
    }

    #[test]
    fn single_row_is_one_page() {
        let page = Page::new(1, 5, 1);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next());
    }
}
