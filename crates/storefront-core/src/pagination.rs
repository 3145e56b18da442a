use serde::{Deserialize, Serialize};

/// Largest page size any consumer may request.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Maximum number of entries [`page_sequence`] ever produces.
pub const MAX_SEQUENCE_ENTRIES: usize = 7;

/// Number of pages needed to show `total` rows, never less than one.
///
/// A zero `page_size` is treated as one.
#[must_use]
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    let size = u64::from(page_size.max(1));
    let pages = total.div_ceil(size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Offset/limit window for one page of a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Page after clamping into `[1, total_pages]`.
    pub page: u32,
    pub total_pages: u32,
    pub offset: u64,
    pub limit: u32,
}

impl PageWindow {
    /// Whether clamping moved the page away from `requested`.
    #[must_use]
    pub fn was_clamped(&self, requested: u32) -> bool {
        self.page != requested
    }
}

/// Compute the window for `page` of a result set with `total` rows.
///
/// The page is clamped into `[1, total_pages]`, so an out-of-range request
/// lands on the last page instead of an empty one.
#[must_use]
pub fn paginate(total: u64, page: u32, page_size: u32) -> PageWindow {
    let page_size = page_size.max(1);
    let total_pages = total_pages(total, page_size);
    let page = page.clamp(1, total_pages);
    PageWindow {
        page,
        total_pages,
        offset: u64::from(page - 1) * u64::from(page_size),
        limit: page_size,
    }
}

/// One entry of a compact page-number control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEntry {
    Page(u32),
    Gap,
}

/// Compact page-number sequence: the first page, the last page, and up to
/// three pages around `current`, with [`PageEntry::Gap`] where pages are
/// skipped.
///
/// Every page is listed when `total_pages` is seven or fewer.
#[must_use]
pub fn page_sequence(current: u32, total_pages: u32) -> Vec<PageEntry> {
    let total_pages = total_pages.max(1);
    let current = current.clamp(1, total_pages);

    if total_pages as usize <= MAX_SEQUENCE_ENTRIES {
        return (1..=total_pages).map(PageEntry::Page).collect();
    }

    let mut entries = Vec::with_capacity(MAX_SEQUENCE_ENTRIES);
    entries.push(PageEntry::Page(1));
    if current > 3 {
        entries.push(PageEntry::Gap);
    }

    let start = current.saturating_sub(1).max(2);
    let end = (current + 1).min(total_pages - 1);
    entries.extend((start..=end).map(PageEntry::Page));

    if current < total_pages - 2 {
        entries.push(PageEntry::Gap);
    }
    entries.push(PageEntry::Page(total_pages));
    entries
}

/// One page of results plus the metadata a client needs to render controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPage<T> {
    pub items: Vec<T>,
    pub total: u64,
    /// Page actually served, after clamping.
    pub page: u32,
    /// Page the caller asked for. Differs from `page` when it was out of range.
    pub requested_page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> ResultPage<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, window: &PageWindow, requested_page: u32) -> Self {
        Self {
            items,
            total,
            page: window.page,
            requested_page,
            page_size: window.limit,
            total_pages: window.total_pages,
        }
    }

    #[must_use]
    pub fn map<U, F>(self, f: F) -> ResultPage<U>
    where
        F: FnMut(T) -> U,
    {
        ResultPage {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            requested_page: self.requested_page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }

    #[must_use]
    pub fn was_clamped(&self) -> bool {
        self.page != self.requested_page
    }

    /// 1-based position of the first item on this page, or `0` when empty.
    #[must_use]
    pub fn first_position(&self) -> u64 {
        if self.items.is_empty() {
            0
        } else {
            u64::from(self.page - 1) * u64::from(self.page_size) + 1
        }
    }

    /// 1-based position of the last item on this page, or `0` when empty.
    #[must_use]
    pub fn last_position(&self) -> u64 {
        if self.items.is_empty() {
            0
        } else {
            self.first_position() + self.items.len() as u64 - 1
        }
    }
}
