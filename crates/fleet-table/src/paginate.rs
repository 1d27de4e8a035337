//! Pagination over grouped rows.
//!
//! The page window runs over the concatenation of all buckets in order. A
//! bucket appears on a page when at least one of its rows does, and keeps
//! reporting its full row count.

use std::ops::Range;

use fleet_model::{InventoryItem, ItemId};

use crate::group::Bucket;

/// Default rows per page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page (0-indexed).
    pub page: usize,
    /// Rows per page. Zero disables pagination.
    pub page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self { page, page_size }
    }

    /// Create with a custom rows per page value.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size,
            ..Default::default()
        }
    }

    /// Number of pages for `total` rows; never less than one.
    pub fn page_count(&self, total: usize) -> usize {
        if self.page_size == 0 {
            return 1;
        }
        total.div_ceil(self.page_size).max(1)
    }

    /// The same pagination with `page` moved onto the last page if it overshoots.
    #[must_use]
    pub fn clamped(self, total: usize) -> Self {
        Self {
            page: self.page.min(self.page_count(total) - 1),
            ..self
        }
    }

    /// Row range of the (clamped) current page.
    pub fn range(&self, total: usize) -> Range<usize> {
        if self.page_size == 0 {
            return 0..total;
        }
        let page = self.clamped(total).page;
        let start = (page * self.page_size).min(total);
        let end = (start + self.page_size).min(total);
        start..end
    }
}

/// A bucket as rendered on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageBucket<'a> {
    pub key: String,
    pub label: String,
    /// Rows in the whole bucket, across pages.
    pub total: usize,
    /// Rows of this bucket on the current page.
    pub items: Vec<&'a InventoryItem>,
}

impl PageBucket<'_> {
    /// Ids rendered under this bucket's header; the scope of its select-all.
    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    pub buckets: Vec<PageBucket<'a>>,
    pub page: usize,
    pub page_count: usize,
    pub total_rows: usize,
}

impl<'a> Page<'a> {
    /// All rendered rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &'a InventoryItem> + '_ {
        self.buckets.iter().flat_map(|b| b.items.iter().copied())
    }

    /// Ids of every rendered row; the scope of the table-wide select-all.
    pub fn visible_ids(&self) -> Vec<ItemId> {
        self.rows().map(|item| item.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.total_rows == 0
    }
}

/// Cut the current page out of grouped rows.
pub fn paginate<'a>(buckets: Vec<Bucket<'a>>, pagination: Pagination) -> Page<'a> {
    let total_rows: usize = buckets.iter().map(Bucket::len).sum();
    let window = pagination.range(total_rows);
    let page = pagination.clamped(total_rows).page;

    let mut offset = 0;
    let mut page_buckets = Vec::new();
    for bucket in buckets {
        let len = bucket.len();
        let start = window.start.max(offset);
        let end = window.end.min(offset + len);
        // Empty buckets only survive when there is nothing else to show.
        if start < end || total_rows == 0 {
            let items = if start < end {
                bucket.items[start - offset..end - offset].to_vec()
            } else {
                Vec::new()
            };
            page_buckets.push(PageBucket {
                key: bucket.key,
                label: bucket.label,
                total: len,
                items,
            });
        }
        offset += len;
    }

    Page {
        buckets: page_buckets,
        page,
        page_count: pagination.page_count(total_rows),
        total_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{GroupDimension, group};

    fn items(n: u64) -> Vec<InventoryItem> {
        (1..=n).map(InventoryItem::new).collect()
    }

    #[test]
    fn page_count_and_clamp() {
        let p = Pagination::new(9, 10);
        assert_eq!(p.page_count(0), 1);
        assert_eq!(p.page_count(25), 3);
        assert_eq!(p.clamped(25).page, 2);
        assert_eq!(p.range(25), 20..25);
    }

    #[test]
    fn zero_page_size_shows_everything() {
        let rows = items(7);
        let page = paginate(group(&rows, GroupDimension::None), Pagination::new(3, 0));
        assert_eq!(page.visible_ids().len(), 7);
        assert_eq!(page.page, 0);
        assert_eq!(page.page_count, 1);
    }

    #[test]
    fn window_spans_buckets() {
        let rows: Vec<InventoryItem> = (1..=5u64)
            .map(|i| {
                InventoryItem::new(i).with_status(if i <= 3 { "active" } else { "inactive" })
            })
            .collect();
        let page = paginate(group(&rows, GroupDimension::Status), Pagination::new(1, 2));

        assert_eq!(page.total_rows, 5);
        assert_eq!(page.page_count, 3);
        assert_eq!(page.buckets.len(), 2);
        assert_eq!(page.buckets[0].label, "Active");
        assert_eq!(page.buckets[0].total, 3);
        assert_eq!(page.buckets[0].ids(), [ItemId(3)]);
        assert_eq!(page.buckets[1].label, "Inactive");
        assert_eq!(page.buckets[1].ids(), [ItemId(4)]);
    }

    #[test]
    fn empty_collection_keeps_header_bucket() {
        let rows: Vec<InventoryItem> = Vec::new();
        let page = paginate(group(&rows, GroupDimension::None), Pagination::default());
        assert!(page.is_empty());
        assert_eq!(page.buckets.len(), 1);
        assert_eq!(page.buckets[0].total, 0);
    }
}
