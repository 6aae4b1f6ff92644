//! Sharded buffer pool.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::error::BufferError;
use super::guard::PageRef;
use super::instance::BufferPoolInstance;
use super::BufferPoolManager;
use crate::storage::{DiskManager, LogManager, PageId};

/// A buffer pool partitioned across `num_instances` independent
/// [`BufferPoolInstance`]s to cut latch contention.
///
/// Every operation on an existing page routes to the shard
/// `page_id % num_instances`; because each shard only ever allocates ids
/// in its own residue class, the owning shard of any id is a pure
/// function of the id. Shards share nothing but the disk manager, so
/// they scale near-linearly under a uniform id distribution.
///
/// `new_page` is the one cross-shard operation: it rotates a starting
/// index over the shards (guarded by a dedicated router latch) and takes
/// the first shard with a frame to spare, which spreads frame
/// consumption evenly.
pub struct ParallelBufferPoolManager<D: DiskManager> {
    instances: Vec<BufferPoolInstance<D>>,

    /// Router latch: serializes only the starting-index rotation. Never
    /// held while a shard latch is held.
    starting_index: Mutex<usize>,

    /// Frames per shard.
    frames_per_instance: usize,
}

impl<D: DiskManager> ParallelBufferPoolManager<D> {
    /// Creates a pool of `num_instances` shards with
    /// `frames_per_instance` frames each, all sharing one disk manager
    /// and log manager.
    ///
    /// # Panics
    ///
    /// Panics if `num_instances` or `frames_per_instance` is 0.
    pub fn new(
        num_instances: u32,
        frames_per_instance: usize,
        disk: Arc<D>,
        log: Arc<LogManager>,
    ) -> Self {
        assert!(num_instances > 0, "num_instances must be > 0");

        let instances = (0..num_instances)
            .map(|i| {
                BufferPoolInstance::with_sharding(
                    frames_per_instance,
                    num_instances,
                    i,
                    Arc::clone(&disk),
                    Arc::clone(&log),
                )
            })
            .collect();

        Self {
            instances,
            starting_index: Mutex::new(0),
            frames_per_instance,
        }
    }

    /// Number of shards.
    pub fn num_instances(&self) -> usize {
        self.instances.len()
    }

    /// The shard responsible for `page_id`.
    fn instance_for(&self, page_id: PageId) -> &BufferPoolInstance<D> {
        let shard = page_id.as_i32().rem_euclid(self.instances.len() as i32) as usize;
        &self.instances[shard]
    }

    /// Pin count of a resident page, or `None` if not resident anywhere.
    pub fn pin_count(&self, page_id: PageId) -> Option<u32> {
        self.instance_for(page_id).pin_count(page_id)
    }
}

impl<D: DiskManager> BufferPoolManager for ParallelBufferPoolManager<D> {
    /// Allocates a new page on the next shard in rotation, falling back
    /// through the remaining shards if it is out of frames.
    ///
    /// The rotation advances exactly once per call, successful or not,
    /// so consecutive allocations spread across shards.
    fn new_page(&self) -> Result<PageRef<'_>, BufferError> {
        let start = {
            let mut index = self.starting_index.lock();
            let start = *index;
            *index = (start + 1) % self.instances.len();
            start
        };

        for offset in 0..self.instances.len() {
            let shard = (start + offset) % self.instances.len();
            match self.instances[shard].new_page() {
                Ok(page) => return Ok(page),
                Err(BufferError::PoolExhausted) => continue,
                Err(e) => return Err(e),
            }
        }

        debug!(shards = self.instances.len(), "all shards exhausted on new_page");
        Err(BufferError::PoolExhausted)
    }

    fn fetch_page(&self, page_id: PageId) -> Result<PageRef<'_>, BufferError> {
        self.instance_for(page_id).fetch_page(page_id)
    }

    fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        self.instance_for(page_id).unpin_page(page_id, is_dirty)
    }

    fn delete_page(&self, page_id: PageId) -> Result<bool, BufferError> {
        self.instance_for(page_id).delete_page(page_id)
    }

    fn flush_page(&self, page_id: PageId) -> Result<bool, BufferError> {
        self.instance_for(page_id).flush_page(page_id)
    }

    fn flush_all_pages(&self) -> Result<(), BufferError> {
        for instance in &self.instances {
            instance.flush_all_pages()?;
        }
        Ok(())
    }

    /// Total frames across all shards.
    fn pool_size(&self) -> usize {
        self.instances.len() * self.frames_per_instance
    }
}
