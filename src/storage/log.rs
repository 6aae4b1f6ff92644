//! Write-ahead log handle.

use std::sync::atomic::{AtomicU64, Ordering};

/// Handle to the engine's write-ahead log.
///
/// Every buffer pool instance holds a reference to the log manager for
/// recovery coordination. The pool itself makes no calls on it today; a
/// full ARIES-style integration would flush log records up to a frame's
/// page LSN before writing the page out during eviction.
pub struct LogManager {
    /// LSN reached by records durably on disk.
    flushed_lsn: AtomicU64,
}

impl LogManager {
    /// Creates a new log manager with nothing flushed.
    pub fn new() -> Self {
        Self {
            flushed_lsn: AtomicU64::new(0),
        }
    }

    /// LSN up to which log records are durable.
    pub fn flushed_lsn(&self) -> u64 {
        self.flushed_lsn.load(Ordering::Acquire)
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}
