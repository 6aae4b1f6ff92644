//! Buffer pool errors.

use crate::storage::DiskError;

/// Errors that can occur during buffer pool operations.
#[derive(Debug)]
pub enum BufferError {
    /// Every frame is pinned: the free list is empty and the replacer has
    /// no victim to offer.
    ///
    /// This is the pool's normal backpressure signal, not a failure.
    /// Callers decide whether to release pins and retry or give up.
    PoolExhausted,

    /// Underlying disk I/O error. Never retried by the pool.
    Disk(DiskError),
}

impl std::fmt::Display for BufferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferError::PoolExhausted => {
                write!(f, "no free frames available and all pages are pinned")
            }
            BufferError::Disk(e) => write!(f, "disk error: {}", e),
        }
    }
}

impl std::error::Error for BufferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BufferError::Disk(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DiskError> for BufferError {
    fn from(e: DiskError) -> Self {
        BufferError::Disk(e)
    }
}
