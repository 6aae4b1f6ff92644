//! Integration tests for the sharded buffer pool.

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use stratum::storage::buffer::{BufferError, BufferPoolManager, ParallelBufferPoolManager};
use stratum::storage::{FileDiskManager, LogManager, MemoryDiskManager};
use tempfile::tempdir;

fn parallel_pool(
    num_instances: u32,
    frames_per_instance: usize,
) -> ParallelBufferPoolManager<MemoryDiskManager> {
    ParallelBufferPoolManager::new(
        num_instances,
        frames_per_instance,
        Arc::new(MemoryDiskManager::new()),
        Arc::new(LogManager::new()),
    )
}

#[test]
fn test_allocation_covers_every_shard_per_round() {
    let pool = parallel_pool(4, 10);

    let mut seen_per_round = Vec::new();
    for _round in 0..2 {
        let mut residues = HashSet::new();
        for _ in 0..4 {
            let page = pool.new_page().unwrap();
            residues.insert(page.page_id().as_i32() % 4);
            pool.unpin_page(page.page_id(), false);
        }
        seen_per_round.push(residues);
    }

    // Each round of N allocations touches each shard exactly once.
    for residues in seen_per_round {
        assert_eq!(residues.len(), 4);
    }
}

#[test]
fn test_every_id_satisfies_shard_residue() {
    let pool = parallel_pool(4, 10);

    for _ in 0..20 {
        let page = pool.new_page().unwrap();
        let id = page.page_id();
        pool.unpin_page(id, false);

        // The id routes back to a shard that has it resident.
        assert!(pool.pin_count(id).is_some());
    }
}

#[test]
fn test_no_id_allocated_twice() {
    let pool = parallel_pool(4, 4);

    let mut seen = HashSet::new();
    for _ in 0..40 {
        match pool.new_page() {
            Ok(page) => {
                assert!(seen.insert(page.page_id()), "duplicate id {}", page.page_id());
                pool.unpin_page(page.page_id(), false);
            }
            Err(BufferError::PoolExhausted) => unreachable!("pages are unpinned each step"),
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
}

#[test]
fn test_exhaustion_only_after_every_shard_is_full() {
    let pool = parallel_pool(2, 2);

    // Pin every frame in both shards.
    let mut ids = Vec::new();
    for _ in 0..4 {
        ids.push(pool.new_page().unwrap().page_id());
    }
    assert!(matches!(pool.new_page(), Err(BufferError::PoolExhausted)));

    // One free frame anywhere is enough again.
    pool.unpin_page(ids[0], false);
    let page = pool.new_page().unwrap();
    pool.unpin_page(page.page_id(), false);
    for &id in &ids[1..] {
        pool.unpin_page(id, false);
    }
}

#[test]
fn test_sharded_round_trip_through_file() {
    let dir = tempdir().unwrap();
    let disk = Arc::new(FileDiskManager::open(dir.path().join("test.db")).unwrap());
    let pool = ParallelBufferPoolManager::new(4, 2, disk, Arc::new(LogManager::new()));

    // Write a distinct byte to 8 pages, one pool's worth.
    let mut ids = Vec::new();
    for i in 0..8u8 {
        let page = pool.new_page().unwrap();
        page.data_mut().as_mut_slice()[0] = i;
        ids.push(page.page_id());
        pool.unpin_page(page.page_id(), true);
    }

    // Churn through more pages to evict the first batch.
    for _ in 0..8 {
        let page = pool.new_page().unwrap();
        pool.unpin_page(page.page_id(), false);
    }

    for (i, &id) in ids.iter().enumerate() {
        let page = pool.fetch_page(id).unwrap();
        assert_eq!(page.data().as_slice()[0], i as u8, "page {}", id);
        pool.unpin_page(id, false);
    }
}

#[test]
fn test_concurrent_allocation_across_shards() {
    let pool = Arc::new(parallel_pool(4, 16));
    let barrier = Arc::new(Barrier::new(8));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = Arc::clone(&pool);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            let mut ids = Vec::new();
            for _ in 0..8 {
                let page = pool.new_page().unwrap();
                ids.push(page.page_id());
                pool.unpin_page(page.page_id(), false);
            }
            ids
        }));
    }

    let mut all_ids = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(all_ids.insert(id), "id {} allocated twice", id);
        }
    }
    assert_eq!(all_ids.len(), 64);
}

#[test]
fn test_concurrent_readers_on_shared_pages() {
    let pool = Arc::new(parallel_pool(4, 4));

    let mut ids = Vec::new();
    for i in 0..8u8 {
        let page = pool.new_page().unwrap();
        page.data_mut().as_mut_slice()[0] = i;
        ids.push(page.page_id());
        pool.unpin_page(page.page_id(), true);
    }

    let ids = Arc::new(ids);
    let mut handles = Vec::new();
    for t in 0..4 {
        let pool = Arc::clone(&pool);
        let ids = Arc::clone(&ids);
        handles.push(thread::spawn(move || {
            for round in 0..100 {
                let idx = (t + round) % ids.len();
                let id = ids[idx];
                let page = pool.fetch_page(id).unwrap();
                assert_eq!(page.data().as_slice()[0], idx as u8);
                pool.unpin_page(id, false);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_flush_page_delegates_to_owner() {
    let disk = Arc::new(MemoryDiskManager::new());
    let pool = ParallelBufferPoolManager::new(3, 2, Arc::clone(&disk), Arc::new(LogManager::new()));

    let page_id = {
        let page = pool.new_page().unwrap();
        page.data_mut().as_mut_slice()[0] = 0xCD;
        page.page_id()
    };
    pool.unpin_page(page_id, true);

    assert!(pool.flush_page(page_id).unwrap());
    assert_eq!(disk.write_count(page_id), 1);

    // Not resident anywhere after delete, flush reports false.
    assert!(pool.delete_page(page_id).unwrap());
    assert!(!pool.flush_page(page_id).unwrap());
}
