//! Blocking page I/O backends.

use crate::storage::{DiskError, PageId};

mod file;
mod memory;

pub use file::FileDiskManager;
pub use memory::MemoryDiskManager;

/// Blocking page I/O backend.
///
/// This trait defines the interface for reading and writing 4KB pages
/// using caller-owned buffers. Implementations include:
/// - [`FileDiskManager`]: disk-backed storage over a single database file
/// - [`MemoryDiskManager`]: in-memory storage for testing
///
/// # Design
///
/// 1. **Blocking calls**: all I/O is synchronous and runs in the caller's
///    thread. The buffer pool performs I/O while holding its latch, so a
///    slow read or write stalls other operations on the same pool
///    instance; sharding across instances is the mitigation.
///
/// 2. **Caller-owned buffers**: the backend reads and writes raw bytes
///    only. Memory management belongs to the caller (the buffer pool's
///    frames).
///
/// 3. **Sparse reads**: a page that has never been written reads back as
///    zeros. Backends must zero-fill short reads past the end of the
///    allocated space rather than fail, since the buffer pool allocates
///    ids without touching the disk.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`; the buffer pool shares one
/// backend across all of its shards.
pub trait DiskManager: Send + Sync {
    /// Reads a page into a caller-provided buffer.
    ///
    /// Bytes past the end of the backing store are zero-filled.
    ///
    /// # Errors
    ///
    /// Returns `DiskError::InvalidBufferSize` if `buf.len() != PAGE_SIZE`.
    /// I/O failures are fatal to the operation; this layer never retries.
    ///
    /// # Panics
    ///
    /// Panics if `page_id` is invalid; reading the sentinel id is a
    /// caller bug.
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> Result<(), DiskError>;

    /// Writes a page from a caller-provided buffer.
    ///
    /// # Errors
    ///
    /// Returns `DiskError::InvalidBufferSize` if `buf.len() != PAGE_SIZE`.
    ///
    /// # Panics
    ///
    /// Panics if `page_id` is invalid.
    fn write_page(&self, page_id: PageId, buf: &[u8]) -> Result<(), DiskError>;

    /// Forces all pending writes down to the physical device.
    ///
    /// For [`MemoryDiskManager`] this is a no-op. For [`FileDiskManager`]
    /// this calls `sync_all` on the underlying file.
    fn sync(&self) -> Result<(), DiskError>;
}
