//! File-backed page storage.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::DiskManager;
use crate::storage::error::DiskError;
use crate::storage::page::{PageId, PAGE_SIZE};

/// File-backed page storage.
///
/// Stores pages as contiguous 4KB blocks in a single file; page `n` lives
/// at byte offset `n * PAGE_SIZE`.
///
/// # File layout
///
/// ```text
/// +------------------+------------------+------------------+
/// | Page 0 (4KB)     | Page 1 (4KB)     | Page 2 (4KB)     | ...
/// +------------------+------------------+------------------+
/// ^ offset 0         ^ offset 4096      ^ offset 8192
/// ```
///
/// # Concurrency
///
/// A single `Mutex` around the file handle serializes all I/O. The buffer
/// pool already serializes I/O per shard under its latch, so the file
/// mutex only matters when several shards share one backend.
///
/// # Durability
///
/// Writes land in the OS page cache; [`DiskManager::sync`] forces them to
/// the device. Crash durability between syncs is the engine's write-ahead
/// log's concern, not this layer's.
pub struct FileDiskManager {
    /// Path to the database file.
    path: PathBuf,
    /// File handle; all access is serialized.
    file: Mutex<File>,
}

impl FileDiskManager {
    /// Opens or creates a database file at the given path.
    ///
    /// # Errors
    ///
    /// Returns `DiskError::Corrupted` if an existing file's size is not a
    /// multiple of `PAGE_SIZE`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DiskError> {
        let path = path.into();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let file_size = file.metadata()?.len();
        if file_size % PAGE_SIZE as u64 != 0 {
            return Err(DiskError::Corrupted(format!(
                "file size {} is not a multiple of page size {}",
                file_size, PAGE_SIZE
            )));
        }

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Returns the path to the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DiskManager for FileDiskManager {
    fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> Result<(), DiskError> {
        assert!(page_id.is_valid(), "read of invalid page id {}", page_id);
        if buf.len() != PAGE_SIZE {
            return Err(DiskError::InvalidBufferSize {
                expected: PAGE_SIZE,
                actual: buf.len(),
            });
        }

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(page_id.byte_offset()))?;

        // Pages past the current end of file read back as zeros; the pool
        // allocates ids without extending the file.
        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        buf[filled..].fill(0);

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

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(page_id.byte_offset()))?;
        file.write_all(buf)?;

        Ok(())
    }

    fn sync(&self) -> Result<(), DiskError> {
        let file = self.file.lock();
        file.sync_all()?;
        Ok(())
    }
}
