//! Page handles and the RAII pin guard.

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use super::frame::Frame;
use super::BufferPoolManager;
use crate::storage::{PageData, PageId};

/// Handle to a pinned page frame.
///
/// Returned by `new_page` and `fetch_page`; the caller owns one pin on
/// the page and must release it with
/// [`unpin_page`](BufferPoolManager::unpin_page) when done. The handle
/// stays usable only while that pin is held: the pool cannot evict a
/// pinned page, but nothing stops a caller from keeping the handle past
/// its unpin, which is a contract violation.
pub struct PageRef<'a> {
    frame: &'a Frame,
    page_id: PageId,
}

impl<'a> PageRef<'a> {
    pub(super) fn new(frame: &'a Frame, page_id: PageId) -> Self {
        Self { frame, page_id }
    }

    /// The id of the pinned page.
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Acquires shared access to the page bytes.
    pub fn data(&self) -> RwLockReadGuard<'a, PageData> {
        self.frame.data()
    }

    /// Acquires exclusive access to the page bytes.
    ///
    /// Writing through this access does not mark the page dirty by
    /// itself; pass `is_dirty = true` on unpin (or use
    /// [`PinnedPage`]).
    pub fn data_mut(&self) -> RwLockWriteGuard<'a, PageData> {
        self.frame.data_mut()
    }
}

/// RAII wrapper that unpins its page on drop.
///
/// Created by [`BufferPoolManager::fetch_pinned`] and
/// [`BufferPoolManager::new_pinned`]. Tracks a dirty bit: taking
/// exclusive access through [`data_mut`](PinnedPage::data_mut) (or
/// calling [`mark_dirty`](PinnedPage::mark_dirty)) makes the drop report
/// the page dirty.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use stratum::storage::buffer::{BufferPoolInstance, BufferPoolManager};
/// use stratum::storage::{LogManager, MemoryDiskManager};
///
/// let pool = BufferPoolInstance::new(
///     8,
///     Arc::new(MemoryDiskManager::new()),
///     Arc::new(LogManager::new()),
/// );
/// let mut page = pool.new_pinned().unwrap();
/// page.data_mut().as_mut_slice()[0..5].copy_from_slice(b"hello");
/// drop(page); // unpins, dirty
/// ```
pub struct PinnedPage<'a, M: BufferPoolManager + ?Sized> {
    pool: &'a M,
    page: PageRef<'a>,
    dirty: bool,
}

impl<'a, M: BufferPoolManager + ?Sized> PinnedPage<'a, M> {
    pub(super) fn new(pool: &'a M, page: PageRef<'a>) -> Self {
        Self {
            pool,
            page,
            dirty: false,
        }
    }

    /// The id of the pinned page.
    pub fn page_id(&self) -> PageId {
        self.page.page_id()
    }

    /// Acquires shared access to the page bytes.
    pub fn data(&self) -> RwLockReadGuard<'a, PageData> {
        self.page.data()
    }

    /// Acquires exclusive access to the page bytes and marks the page
    /// dirty.
    pub fn data_mut(&mut self) -> RwLockWriteGuard<'a, PageData> {
        self.dirty = true;
        self.page.data_mut()
    }

    /// Forces the unpin on drop to report the page dirty.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

impl<'a, M: BufferPoolManager + ?Sized> Drop for PinnedPage<'a, M> {
    fn drop(&mut self) {
        self.pool.unpin_page(self.page.page_id(), self.dirty);
    }
}
