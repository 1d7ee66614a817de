//! Client-side pagination of projected rows.
//!
//! [`paginate`] is a pure slice: the same rows, page size and page number always give the same
//! page. [`PaginationState`] applies the change contract list screens rely on: a new page size
//! always goes back to page 1.

use serde::{Deserialize, Serialize};

/// One page of rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub page_rows: &'a [T],
    pub total_items: usize,
    /// 1-indexed page number this slice was taken for.
    pub page: usize,
    pub page_size: usize,
}

impl<T> Page<'_, T> {
    pub fn total_pages(&self) -> usize {
        total_pages(self.total_items, self.page_size)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

/// Number of pages needed for `total_items`; `0` when `page_size` is `0`.
pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_items.div_ceil(page_size)
}

/// Slice `rows[(page_number - 1) * page_size .. page_number * page_size]`, clipped to bounds.
///
/// `page_number` is 1-indexed. A zero page size or page number, or a page past the end,
/// yields an empty slice.
pub fn paginate<T>(rows: &[T], page_size: usize, page_number: usize) -> Page<'_, T> {
    let page_rows = match page_number.checked_sub(1) {
        Some(index) if page_size > 0 => {
            let start = index.saturating_mul(page_size).min(rows.len());
            let end = start.saturating_add(page_size).min(rows.len());
            &rows[start..end]
        }
        _ => &rows[..0],
    };

    Page {
        page_rows,
        total_items: rows.len(),
        page: page_number,
        page_size,
    }
}

/// The `{ pageSize, page }` payload a table's pagination control emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageChange {
    pub page_size: usize,
    pub page: usize,
}

/// Current page navigation of a list screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    page_size: usize,
    page: usize,
}

impl PaginationState {
    /// Start on page 1. A zero page size is raised to 1.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            page: 1,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Apply a change emitted by the pagination control.
    ///
    /// A changed page size resets to page 1. Otherwise the requested page is clamped to
    /// `1..=max(total_pages, 1)` for `total_items`.
    pub fn apply(&mut self, change: PageChange, total_items: usize) {
        let page_size = change.page_size.max(1);

        if page_size != self.page_size {
            tracing::debug!(
                from = self.page_size,
                to = page_size,
                "page size changed; returning to first page"
            );
            self.page_size = page_size;
            self.page = 1;
            return;
        }

        let last = total_pages(total_items, self.page_size).max(1);
        self.page = change.page.clamp(1, last);
    }

    /// The current page of `rows`.
    pub fn slice<'a, T>(&self, rows: &'a [T]) -> Page<'a, T> {
        paginate(rows, self.page_size, self.page)
    }
}
