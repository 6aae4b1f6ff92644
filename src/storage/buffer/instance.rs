//! Single buffer pool instance.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::error::BufferError;
use super::frame::{Frame, FrameId, FrameMeta};
use super::guard::PageRef;
use super::replacer::{LruReplacer, Replacer};
use super::BufferPoolManager;
use crate::storage::{DiskManager, LogManager, PageId};

/// A single buffer pool instance: `pool_size` frames, a page table, a
/// free list, and an LRU replacer, all guarded by one exclusive latch.
///
/// # Architecture
///
/// ```text
/// +------------------+     +------------------+
/// | fetch_page()     |---->| page_table       |
/// | new_page()       |     | PageId -> FrameId|
/// | unpin_page() ... |     +------------------+
/// +------------------+              |
///          |                        v
///          |               +------------------+
///          |               | meta: Vec<Meta>  |  pin counts, dirty bits
///          v               +------------------+
/// +------------------+     +------------------+
/// | free_list        |     | frames: Vec      |  page bytes
/// | replacer (LRU)   |     +------------------+
/// +------------------+              |
///                                   v
///                          +------------------+
///                          | DiskManager      |
///                          +------------------+
/// ```
///
/// # Latching
///
/// One mutex guards the page table, free list, replacer, and all frame
/// metadata. It is taken at the start of every public operation and held
/// until return, including across disk I/O, which keeps the invariants
/// trivially sequential at the cost of stalling the shard during a slow
/// read or write. Frame *data* locks sit below the latch in the lock
/// order; the latch is never acquired while holding one.
///
/// # Frame accounting
///
/// Every frame is in exactly one of three places at any time: the free
/// list (holds no page), the replacer (resident, unpinned), or pinned
/// (resident, `pin_count > 0`).
pub struct BufferPoolInstance<D: DiskManager> {
    disk: Arc<D>,

    /// Held for recovery coordination on dirty eviction; unused today.
    #[allow(dead_code)]
    log: Arc<LogManager>,

    /// Page bytes, one slot per frame. The Vec itself is immutable after
    /// construction; each frame has its own data lock.
    frames: Vec<Frame>,

    /// All mutable bookkeeping, under the instance latch.
    state: Mutex<InstanceState>,

    pool_size: usize,
    num_instances: u32,
    instance_index: u32,
}

struct InstanceState {
    /// Maps resident pages to their frames. One-to-one.
    page_table: HashMap<PageId, FrameId>,

    /// Metadata for each frame, indexed by frame id.
    meta: Vec<FrameMeta>,

    /// Frames holding no page: never used, or freed by `delete_page`.
    /// Consumed from the front, refilled at the back.
    free_list: VecDeque<FrameId>,

    /// Eviction candidates (resident, unpinned).
    replacer: LruReplacer,

    /// Next id this instance will hand out. Advances by `num_instances`
    /// on every allocation, so ids keep their residue class.
    next_page_id: i32,
}

impl<D: DiskManager> BufferPoolInstance<D> {
    /// Creates a stand-alone instance (not part of a parallel pool).
    ///
    /// # Panics
    ///
    /// Panics if `pool_size` is 0.
    pub fn new(pool_size: usize, disk: Arc<D>, log: Arc<LogManager>) -> Self {
        Self::with_sharding(pool_size, 1, 0, disk, log)
    }

    /// Creates an instance that is shard `instance_index` of
    /// `num_instances`. Ids allocated here satisfy
    /// `id % num_instances == instance_index`.
    ///
    /// # Panics
    ///
    /// Panics if `pool_size` or `num_instances` is 0, or if
    /// `instance_index >= num_instances`.
    pub fn with_sharding(
        pool_size: usize,
        num_instances: u32,
        instance_index: u32,
        disk: Arc<D>,
        log: Arc<LogManager>,
    ) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");
        assert!(num_instances > 0, "num_instances must be > 0");
        assert!(
            instance_index < num_instances,
            "instance_index {} out of range for {} instances",
            instance_index,
            num_instances
        );

        let frames: Vec<Frame> = (0..pool_size).map(|_| Frame::new()).collect();
        let meta: Vec<FrameMeta> = (0..pool_size).map(|_| FrameMeta::new()).collect();
        let free_list: VecDeque<FrameId> = (0..pool_size).map(FrameId::new).collect();

        Self {
            disk,
            log,
            frames,
            state: Mutex::new(InstanceState {
                page_table: HashMap::with_capacity(pool_size),
                meta,
                free_list,
                replacer: LruReplacer::new(pool_size),
                next_page_id: instance_index as i32,
            }),
            pool_size,
            num_instances,
            instance_index,
        }
    }

    /// Pin count of a resident page, or `None` if not resident.
    pub fn pin_count(&self, page_id: PageId) -> Option<u32> {
        let state = self.state.lock();
        let &frame_id = state.page_table.get(&page_id)?;
        Some(state.meta[frame_id.as_usize()].pin_count())
    }

    /// Number of frames holding no page.
    pub fn free_frame_count(&self) -> usize {
        self.state.lock().free_list.len()
    }

    /// Number of resident, unpinned frames.
    pub fn evictable_count(&self) -> usize {
        self.state.lock().replacer.len()
    }

    /// Number of pages currently resident in this instance.
    pub fn resident_page_count(&self) -> usize {
        self.state.lock().page_table.len()
    }

    /// Allocates the next page id for this instance.
    ///
    /// Called on every `new_page` invocation, including the ones that
    /// fail to find a frame, so the id sequence advances regardless and
    /// higher layers must tolerate gaps.
    fn allocate_page(&self, state: &mut InstanceState) -> PageId {
        let id = state.next_page_id;
        state.next_page_id += self.num_instances as i32;
        assert_eq!(
            id.rem_euclid(self.num_instances as i32) as u32,
            self.instance_index,
            "allocated id {} does not map back to instance {}",
            id,
            self.instance_index
        );
        PageId::new(id)
    }

    /// Hook for reclaiming deallocated page ids.
    ///
    /// Invoked by `delete_page` before any other work. Ids are not reused
    /// today.
    fn deallocate_page(&self, _page_id: PageId) {}

    /// Takes a usable frame: the free list first, then the replacer.
    ///
    /// An evicted frame's old page is written back if dirty and removed
    /// from the page table; the frame comes back cleared. Returns
    /// `Ok(None)` when everything is pinned.
    ///
    /// On a failed write-back the victim stays resident and evictable and
    /// the error is propagated.
    fn take_victim(&self, state: &mut InstanceState) -> Result<Option<FrameId>, BufferError> {
        if let Some(frame_id) = state.free_list.pop_front() {
            return Ok(Some(frame_id));
        }

        let frame_id = match state.replacer.victim() {
            Some(frame_id) => frame_id,
            None => return Ok(None),
        };

        let meta = &state.meta[frame_id.as_usize()];
        if let Some(old_page_id) = meta.page_id() {
            if meta.is_dirty() {
                let data = self.frames[frame_id.as_usize()].data();
                if let Err(e) = self.disk.write_page(old_page_id, data.as_slice()) {
                    drop(data);
                    state.replacer.unpin(frame_id);
                    return Err(e.into());
                }
                debug!(page_id = old_page_id.as_i32(), "wrote back dirty page on eviction");
            }
            state.page_table.remove(&old_page_id);
        }

        state.meta[frame_id.as_usize()].clear();
        Ok(Some(frame_id))
    }

    fn page_ref(&self, frame_id: FrameId, page_id: PageId) -> PageRef<'_> {
        PageRef::new(&self.frames[frame_id.as_usize()], page_id)
    }
}

impl<D: DiskManager> BufferPoolManager for BufferPoolInstance<D> {
    /// Allocates a fresh page id and returns a pinned, zeroed frame for
    /// it.
    ///
    /// The id allocator advances even when the pool is exhausted, so a
    /// failed call still burns an id.
    fn new_page(&self) -> Result<PageRef<'_>, BufferError> {
        let mut state = self.state.lock();

        let new_page_id = self.allocate_page(&mut state);

        let frame_id = match self.take_victim(&mut state)? {
            Some(frame_id) => frame_id,
            None => {
                debug!(instance = self.instance_index, "pool exhausted on new_page");
                return Err(BufferError::PoolExhausted);
            }
        };

        self.frames[frame_id.as_usize()].data_mut().reset();
        state.meta[frame_id.as_usize()].reset(new_page_id);
        state.page_table.insert(new_page_id, frame_id);
        state.replacer.pin(frame_id);

        Ok(self.page_ref(frame_id, new_page_id))
    }

    /// Returns a pinned frame for `page_id`, reading it from disk if not
    /// resident.
    fn fetch_page(&self, page_id: PageId) -> Result<PageRef<'_>, BufferError> {
        let mut state = self.state.lock();

        // Hit: pin in place, no disk read.
        if let Some(&frame_id) = state.page_table.get(&page_id) {
            state.meta[frame_id.as_usize()].pin();
            state.replacer.pin(frame_id);
            return Ok(self.page_ref(frame_id, page_id));
        }

        let frame_id = match self.take_victim(&mut state)? {
            Some(frame_id) => frame_id,
            None => {
                debug!(
                    instance = self.instance_index,
                    page_id = page_id.as_i32(),
                    "pool exhausted on fetch_page"
                );
                return Err(BufferError::PoolExhausted);
            }
        };

        {
            let mut data = self.frames[frame_id.as_usize()].data_mut();
            if let Err(e) = self.disk.read_page(page_id, data.as_mut_slice()) {
                drop(data);
                state.free_list.push_front(frame_id);
                return Err(e.into());
            }
        }

        state.meta[frame_id.as_usize()].reset(page_id);
        state.page_table.insert(page_id, frame_id);
        state.replacer.pin(frame_id);

        Ok(self.page_ref(frame_id, page_id))
    }

    /// Releases one pin on `page_id`, ORing in the caller's dirty flag.
    ///
    /// On the last unpin the frame becomes evictable. Returns whether the
    /// pin count was positive before the decrement.
    ///
    /// # Panics
    ///
    /// Panics if the page is not resident or its pin count is already 0;
    /// both are caller bugs, not recoverable conditions.
    fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let mut state = self.state.lock();

        let frame_id = *state
            .page_table
            .get(&page_id)
            .unwrap_or_else(|| panic!("unpin of page {} not resident in this pool", page_id));

        let meta = &mut state.meta[frame_id.as_usize()];
        let was_pinned = meta.is_pinned();
        if is_dirty {
            meta.set_dirty();
        }
        meta.unpin();

        if !meta.is_pinned() {
            state.replacer.unpin(frame_id);
        }

        was_pinned
    }

    /// Drops a page from the pool and logically frees its id.
    ///
    /// Returns `Ok(true)` if the page is gone afterwards (including the
    /// not-resident case) and `Ok(false)` if the delete was refused
    /// because the page is pinned. A dirty page is written back before
    /// its frame is recycled.
    fn delete_page(&self, page_id: PageId) -> Result<bool, BufferError> {
        self.deallocate_page(page_id);

        let mut state = self.state.lock();

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return Ok(true);
        };

        let meta = &state.meta[frame_id.as_usize()];
        if meta.is_pinned() {
            debug!(
                page_id = page_id.as_i32(),
                pin_count = meta.pin_count(),
                "delete refused, page is pinned"
            );
            return Ok(false);
        }

        if meta.is_dirty() {
            let data = self.frames[frame_id.as_usize()].data();
            self.disk.write_page(page_id, data.as_slice())?;
        }

        state.page_table.remove(&page_id);
        state.replacer.pin(frame_id);
        state.meta[frame_id.as_usize()].clear();
        state.free_list.push_back(frame_id);

        Ok(true)
    }

    /// Writes a resident page to disk unconditionally and clears its
    /// dirty flag. Returns whether the page was resident.
    ///
    /// # Panics
    ///
    /// Panics if `page_id` is the invalid sentinel.
    fn flush_page(&self, page_id: PageId) -> Result<bool, BufferError> {
        assert!(page_id.is_valid(), "flush of invalid page id");

        let mut state = self.state.lock();

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return Ok(false);
        };

        {
            let data = self.frames[frame_id.as_usize()].data();
            self.disk.write_page(page_id, data.as_slice())?;
        }
        state.meta[frame_id.as_usize()].clear_dirty();

        Ok(true)
    }

    /// Writes every resident page to disk and clears all dirty flags.
    fn flush_all_pages(&self) -> Result<(), BufferError> {
        let mut state = self.state.lock();

        for frame_id in 0..self.pool_size {
            let Some(page_id) = state.meta[frame_id].page_id() else {
                continue;
            };
            {
                let data = self.frames[frame_id].data();
                self.disk.write_page(page_id, data.as_slice())?;
            }
            state.meta[frame_id].clear_dirty();
        }

        Ok(())
    }

    fn pool_size(&self) -> usize {
        self.pool_size
    }
}
