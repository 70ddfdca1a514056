//! Read-only queries over archived snapshots

use std::sync::Arc;

use super::{decode_items, ArchiveError, DateKey, SnapshotStore};
use crate::data::Item;

/// Dates shown per page of the archive listing
pub const ITEMS_PER_PAGE: usize = 10;

/// Browses snapshots by date
///
/// Shares the store (and its date index) with the refresh loop, so new
/// snapshots show up as soon as they are written.
#[derive(Debug, Clone)]
pub struct ArchiveReader {
    store: Arc<SnapshotStore>,
}

impl ArchiveReader {
    pub fn new(store: Arc<SnapshotStore>) -> Self {
        Self { store }
    }

    /// Raw payload stored for `date`
    pub async fn get_by_date(&self, date: &DateKey) -> Result<Vec<u8>, ArchiveError> {
        self.store.get(date).await
    }

    /// Items stored for `date`, decoded
    pub async fn items_by_date(&self, date: &DateKey) -> Result<Vec<Item>, ArchiveError> {
        let bytes = self.get_by_date(date).await?;
        decode_items(&bytes)
    }

    /// Every archived date, oldest first
    pub async fn dates(&self) -> Vec<DateKey> {
        self.store.dates().await
    }

    /// A window of `size` archived dates starting at `offset`
    ///
    /// Out-of-range input yields a short or empty page, never an error.
    pub async fn paginate(&self, offset: usize, size: usize) -> Vec<DateKey> {
        let dates = self.store.dates().await;
        paginate(&dates, offset, size).to_vec()
    }

    /// Page `page` (zero-based) of `per_page` dates
    pub async fn page(&self, page: usize, per_page: usize) -> Vec<DateKey> {
        self.paginate(page.saturating_mul(per_page), per_page).await
    }
}

/// Clamps `offset` and `offset + size` to the bounds of `items`
pub fn paginate<T>(items: &[T], offset: usize, size: usize) -> &[T] {
    let start = offset.min(items.len());
    let end = start.saturating_add(size).min(items.len());
    &items[start..end]
}
