//! In-memory page storage for testing.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::DiskManager;
use crate::storage::error::DiskError;
use crate::storage::page::{PageData, PageId, PAGE_SIZE};

/// In-memory page storage for testing and development.
///
/// Pages are materialized on first write; reading a page that was never
/// written returns zeros, matching the sparse-read contract of
/// [`FileDiskManager`](super::FileDiskManager).
///
/// Each write is counted per page, so tests can assert that the buffer
/// pool actually wrote a page back (eviction, flush) rather than only
/// observing the final bytes.
pub struct MemoryDiskManager {
    state: Mutex<MemState>,
}

struct MemState {
    pages: HashMap<PageId, PageData>,
    write_counts: HashMap<PageId, u64>,
}

impl MemoryDiskManager {
    /// Creates a new empty in-memory storage.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemState {
                pages: HashMap::new(),
                write_counts: HashMap::new(),
            }),
        }
    }

    /// Number of pages that have been written at least once.
    pub fn page_count(&self) -> usize {
        self.state.lock().pages.len()
    }

    /// Number of times `write_page` was called for `page_id`.
    pub fn write_count(&self, page_id: PageId) -> u64 {
        self.state
            .lock()
            .write_counts
            .get(&page_id)
            .copied()
            .unwrap_or(0)
    }
}

impl Default for MemoryDiskManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskManager for MemoryDiskManager {
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> Result<(), DiskError> {
        assert!(page_id.is_valid(), "read of invalid page id {}", page_id);
        if buf.len() != PAGE_SIZE {
            return Err(DiskError::InvalidBufferSize {
                expected: PAGE_SIZE,
                actual: buf.len(),
            });
        }

        let state = self.state.lock();
        match state.pages.get(&page_id) {
            Some(page) => buf.copy_from_slice(page.as_slice()),
            None => buf.fill(0),
        }
        Ok(())
    }

    fn write_page(&self, page_id: PageId, buf: &[u8]) -> Result<(), DiskError> {
        assert!(page_id.is_valid(), "write of invalid page id {}", page_id);
        if buf.len() != PAGE_SIZE {
            return Err(DiskError::InvalidBufferSize {
                expected: PAGE_SIZE,
                actual: buf.len(),
            });
        }

        let mut state = self.state.lock();
        state
            .pages
            .entry(page_id)
            .or_default()
            .as_mut_slice()
            .copy_from_slice(buf);
        *state.write_counts.entry(page_id).or_insert(0) += 1;
        Ok(())
    }

    fn sync(&self) -> Result<(), DiskError> {
        Ok(())
    }
}
