//! Page replacement policies for the buffer pool.
//!
//! The replacer tracks which frames are evictable (resident and unpinned)
//! and selects victims when the pool needs a frame.

use hashlink::LinkedHashMap;

use super::frame::FrameId;

/// Trait for page replacement policies.
///
/// # Usage
///
/// ```text
/// // When a frame's pin_count drops to 0
/// replacer.unpin(frame_id);
///
/// // When a frame's pin_count increases from 0
/// replacer.pin(frame_id);
///
/// // When the pool needs a victim
/// if let Some(victim) = replacer.victim() {
///     // Evict the victim frame
/// }
/// ```
///
/// # Thread safety
///
/// Implementations are not internally synchronized. When embedded in a
/// buffer pool instance, every call is already serialized by the
/// instance latch; a stand-alone user wraps the replacer in a `Mutex`.
pub trait Replacer: Send {
    /// Removes and returns the next victim frame.
    ///
    /// Returns `None` iff no frame is evictable.
    fn victim(&mut self) -> Option<FrameId>;

    /// Marks a frame as non-evictable.
    ///
    /// Called when a frame's pin count increases from 0, or when a frame
    /// must be removed from eviction tracking for any other reason
    /// (page deletion). No-op if the frame is not tracked.
    fn pin(&mut self, frame_id: FrameId);

    /// Marks a frame as evictable.
    ///
    /// Called when a frame's pin count decreases to 0. No-op if the frame
    /// is already tracked.
    fn unpin(&mut self, frame_id: FrameId);

    /// Returns the number of evictable frames.
    fn len(&self) -> usize;

    /// Returns true if no frame is evictable.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// LRU (Least Recently Used) page replacement policy.
///
/// Frames are ordered by recency of unpin: `victim()` returns the frame
/// whose transition into the replacer is oldest, and a frame re-entering
/// after a pin counts as newest. Frames unpinned earlier win ties.
///
/// Backed by a [`LinkedHashMap`] keyed by frame id, which keeps insertion
/// order and supports removal by key, so `victim`, `pin`, and `unpin` are
/// all O(1).
pub struct LruReplacer {
    /// Evictable frames in unpin order. Front = least recently unpinned.
    lru: LinkedHashMap<FrameId, ()>,
}

impl LruReplacer {
    /// Creates a new LRU replacer sized for `capacity` frames.
    pub fn new(capacity: usize) -> Self {
        Self {
            lru: LinkedHashMap::with_capacity(capacity),
        }
    }
}

impl Replacer for LruReplacer {
    fn victim(&mut self) -> Option<FrameId> {
        self.lru.pop_front().map(|(frame_id, ())| frame_id)
    }

    fn pin(&mut self, frame_id: FrameId) {
        self.lru.remove(&frame_id);
    }

    fn unpin(&mut self, frame_id: FrameId) {
        if !self.lru.contains_key(&frame_id) {
            self.lru.insert(frame_id, ());
        }
    }

    fn len(&self) -> usize {
        self.lru.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_replacer_is_empty() {
        let replacer = LruReplacer::new(10);
        assert_eq!(replacer.len(), 0);
        assert!(replacer.is_empty());
    }

    #[test]
    fn test_victim_returns_oldest() {
        let mut replacer = LruReplacer::new(10);
        replacer.unpin(FrameId::new(0));
        replacer.unpin(FrameId::new(1));
        replacer.unpin(FrameId::new(2));

        assert_eq!(replacer.len(), 3);
        assert_eq!(replacer.victim(), Some(FrameId::new(0)));
        assert_eq!(replacer.victim(), Some(FrameId::new(1)));
        assert_eq!(replacer.victim(), Some(FrameId::new(2)));
        assert_eq!(replacer.len(), 0);
    }

    #[test]
    fn test_victim_empty_returns_none() {
        let mut replacer = LruReplacer::new(10);
        assert_eq!(replacer.victim(), None);
    }

    #[test]
    fn test_pin_removes_from_eviction() {
        let mut replacer = LruReplacer::new(10);
        replacer.unpin(FrameId::new(0));
        replacer.unpin(FrameId::new(1));
        replacer.unpin(FrameId::new(2));

        replacer.pin(FrameId::new(1));

        assert_eq!(replacer.len(), 2);
        assert_eq!(replacer.victim(), Some(FrameId::new(0)));
        assert_eq!(replacer.victim(), Some(FrameId::new(2)));
        assert_eq!(replacer.victim(), None);
    }

    #[test]
    fn test_pin_nonexistent_is_noop() {
        let mut replacer = LruReplacer::new(10);
        replacer.pin(FrameId::new(99));
        assert_eq!(replacer.len(), 0);
    }

    #[test]
    fn test_unpin_already_unpinned_keeps_position() {
        let mut replacer = LruReplacer::new(10);
        replacer.unpin(FrameId::new(0));
        replacer.unpin(FrameId::new(1));
        replacer.unpin(FrameId::new(0)); // Duplicate, no reorder

        assert_eq!(replacer.len(), 2);
        assert_eq!(replacer.victim(), Some(FrameId::new(0)));
        assert_eq!(replacer.victim(), Some(FrameId::new(1)));
    }

    #[test]
    fn test_reentry_counts_as_newest() {
        let mut replacer = LruReplacer::new(10);
        replacer.unpin(FrameId::new(0));
        replacer.unpin(FrameId::new(1));
        replacer.unpin(FrameId::new(2));

        // Pin and re-unpin frame 0: order becomes 1, 2, 0
        replacer.pin(FrameId::new(0));
        replacer.unpin(FrameId::new(0));

        assert_eq!(replacer.victim(), Some(FrameId::new(1)));
        assert_eq!(replacer.victim(), Some(FrameId::new(2)));
        assert_eq!(replacer.victim(), Some(FrameId::new(0)));
    }

    #[test]
    fn test_interleaved_operations() {
        let mut replacer = LruReplacer::new(10);

        replacer.unpin(FrameId::new(0));
        replacer.unpin(FrameId::new(1));
        assert_eq!(replacer.len(), 2);

        replacer.pin(FrameId::new(0));
        assert_eq!(replacer.len(), 1);

        replacer.unpin(FrameId::new(2));
        assert_eq!(replacer.len(), 2);

        assert_eq!(replacer.victim(), Some(FrameId::new(1)));
        assert_eq!(replacer.victim(), Some(FrameId::new(2)));
        assert_eq!(replacer.victim(), None);
    }
}
