//! Buffer pool: bounded in-memory page cache with LRU replacement.
//!
//! The buffer pool mediates every page read and write between access
//! methods and the disk. Pages are cached in fixed frames; a pinned page
//! is never evicted, unpinned pages become eviction candidates in LRU
//! order, and dirty pages are written back before their frame is reused.
//!
//! Two deployments share one contract: [`BufferPoolInstance`] is a single
//! pool under one latch, and [`ParallelBufferPoolManager`] shards pages
//! across several instances by id to cut contention.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use stratum::storage::buffer::{BufferPoolInstance, BufferPoolManager};
//! use stratum::storage::{FileDiskManager, LogManager};
//!
//! let disk = Arc::new(FileDiskManager::open("app.db").unwrap());
//! let pool = BufferPoolInstance::new(64, disk, Arc::new(LogManager::new()));
//!
//! // Allocate and write a new page.
//! let page = pool.new_page().unwrap();
//! let page_id = page.page_id();
//! page.data_mut().as_mut_slice()[0..5].copy_from_slice(b"hello");
//! pool.unpin_page(page_id, true);
//!
//! // Read it back.
//! let page = pool.fetch_page(page_id).unwrap();
//! assert_eq!(&page.data().as_slice()[0..5], b"hello");
//! pool.unpin_page(page_id, false);
//! ```

mod error;
mod frame;
mod guard;
mod instance;
mod parallel;
mod replacer;

pub use error::BufferError;
pub use frame::FrameId;
pub use guard::{PageRef, PinnedPage};
pub use instance::BufferPoolInstance;
pub use parallel::ParallelBufferPoolManager;
pub use replacer::{LruReplacer, Replacer};

use crate::storage::PageId;

/// The public buffer pool contract, shared by [`BufferPoolInstance`] and
/// [`ParallelBufferPoolManager`].
///
/// # Pin protocol
///
/// `new_page` and `fetch_page` hand back a [`PageRef`] carrying one pin;
/// the caller releases it with [`unpin_page`](Self::unpin_page), passing
/// whether it wrote the page. [`fetch_pinned`](Self::fetch_pinned) and
/// [`new_pinned`](Self::new_pinned) wrap the same protocol in an RAII
/// guard.
///
/// # Errors
///
/// [`BufferError::PoolExhausted`] is the normal "every frame is pinned"
/// answer; callers decide whether to release pins and retry.
/// [`BufferError::Disk`] propagates I/O failures unchanged. Contract
/// violations (unpinning a non-resident page, flushing the invalid id)
/// panic.
pub trait BufferPoolManager: Send + Sync {
    /// Allocates a fresh page id and returns a pinned, zeroed frame.
    ///
    /// The id allocator advances on every call, so an exhausted pool
    /// still consumes an id; the sequence handed out over time may have
    /// gaps.
    fn new_page(&self) -> Result<PageRef<'_>, BufferError>;

    /// Returns a pinned frame holding `page_id`, reading it from disk on
    /// a miss.
    fn fetch_page(&self, page_id: PageId) -> Result<PageRef<'_>, BufferError>;

    /// Releases one pin on `page_id`; `is_dirty` is ORed into the
    /// frame's dirty flag. Returns whether the pin count was positive
    /// before the decrement.
    ///
    /// # Panics
    ///
    /// Panics if the page is not resident or has no outstanding pins.
    fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool;

    /// Removes `page_id` from the pool, writing it back first if dirty.
    /// Returns `Ok(false)` iff the page is pinned (delete refused); a
    /// page that is not resident is already gone, so `Ok(true)`.
    fn delete_page(&self, page_id: PageId) -> Result<bool, BufferError>;

    /// Writes `page_id` to disk unconditionally if resident and clears
    /// its dirty flag. Returns whether it was resident.
    ///
    /// # Panics
    ///
    /// Panics if `page_id` is [`PageId::INVALID`].
    fn flush_page(&self, page_id: PageId) -> Result<bool, BufferError>;

    /// Writes every resident page to disk and clears all dirty flags.
    fn flush_all_pages(&self) -> Result<(), BufferError>;

    /// Total number of frames this pool manages.
    fn pool_size(&self) -> usize;

    /// Like [`new_page`](Self::new_page), wrapped in a guard that unpins
    /// on drop.
    fn new_pinned(&self) -> Result<PinnedPage<'_, Self>, BufferError>
    where
        Self: Sized,
    {
        Ok(PinnedPage::new(self, self.new_page()?))
    }

    /// Like [`fetch_page`](Self::fetch_page), wrapped in a guard that
    /// unpins on drop.
    fn fetch_pinned(&self, page_id: PageId) -> Result<PinnedPage<'_, Self>, BufferError>
    where
        Self: Sized,
    {
        Ok(PinnedPage::new(self, self.fetch_page(page_id)?))
    }
}
