/*!
 * Block Recycling Tests
 * Pool free-list reuse, per-class caps, and stale handle rejection
 */

use pretty_assertions::assert_eq;
use tiered_alloc::{AllocatorConfig, BlockManager, Category, Priority};

fn pooled_manager(limit: usize, classes: Vec<usize>) -> BlockManager {
    BlockManager::new(AllocatorConfig::unconstrained(limit).with_size_classes(classes))
        .expect("valid config")
}

#[test]
fn test_released_pooled_block_is_reused() {
    let mut mgr = pooled_manager(1_000_000, vec![4096]);

    let first = mgr.allocate(1000, Category::Buffer, Priority::Medium, None).unwrap();
    assert!(mgr.release(first));
    assert_eq!(mgr.total_allocated(), 0);

    let pool = &mgr.pool_stats()[0];
    assert_eq!(pool.free_blocks, 1);
    assert_eq!(pool.used_blocks, 0);

    let second = mgr.allocate(3000, Category::Texture, Priority::High, None).unwrap();
    assert_eq!(second.slot(), first.slot());
    assert!(second.generation() > first.generation());
    assert_eq!(mgr.total_allocated(), 4096);

    let block = mgr.peek(second).unwrap();
    assert_eq!(block.category(), Category::Texture);
    assert_eq!(block.priority(), Priority::High);
    assert_eq!(block.ref_count(), 1);
}

#[test]
fn test_stale_handle_does_not_resolve_to_reused_block() {
    let mut mgr = pooled_manager(1_000_000, vec![4096]);

    let stale = mgr.allocate(10, Category::Buffer, Priority::Medium, None).unwrap();
    mgr.release(stale);
    let fresh = mgr.allocate(10, Category::Buffer, Priority::Medium, None).unwrap();

    assert!(mgr.get(stale).is_none());
    assert!(!mgr.release(stale));
    assert!(!mgr.increment_ref(stale));
    assert_eq!(mgr.peek(fresh).map(|b| b.ref_count()), Some(1));
}

#[test]
fn test_reused_block_is_zeroed() {
    let mut mgr = pooled_manager(1_000_000, vec![64]);

    let first = mgr.allocate(64, Category::Buffer, Priority::Medium, None).unwrap();
    mgr.write(first, 0, &[0xAB; 64]).unwrap();
    mgr.release(first);

    let second = mgr.allocate(64, Category::Buffer, Priority::Medium, None).unwrap();
    assert_eq!(mgr.read(second, 0, 64).unwrap(), vec![0u8; 64]);
}

#[test]
fn test_pool_never_exceeds_class_budget() {
    // 100_000 / (1000 * 10) = 10 blocks in the 1000 byte class
    let mut mgr = pooled_manager(100_000, vec![1000]);

    let ids: Vec<_> = (0..25)
        .map(|_| mgr.allocate(500, Category::Buffer, Priority::Medium, None).unwrap())
        .collect();

    let pooled = ids.iter().filter(|&&id| mgr.peek(id).unwrap().is_pooled()).count();
    assert_eq!(pooled, 10);

    let pool = &mgr.pool_stats()[0];
    assert_eq!(pool.max_blocks, 10);
    assert_eq!(pool.used_blocks, 10);
    assert_eq!(mgr.total_allocated(), 10 * 1000 + 15 * 500);
}

#[test]
fn test_class_with_zero_budget_is_bypassed() {
    // 100_000 / (50_000 * 10) rounds down to zero
    let mut mgr = pooled_manager(100_000, vec![50_000]);

    let id = mgr.allocate(20_000, Category::Buffer, Priority::Medium, None).unwrap();
    assert_eq!(mgr.peek(id).map(|b| b.size()), Some(20_000));
    assert_eq!(mgr.pool_stats()[0].max_blocks, 0);
}

#[test]
fn test_free_blocks_do_not_count_as_allocated() {
    let mut mgr = pooled_manager(1_000_000, vec![4096]);

    let ids: Vec<_> = (0..4)
        .map(|_| mgr.allocate(100, Category::Buffer, Priority::Medium, None).unwrap())
        .collect();
    for id in &ids[..3] {
        mgr.release(*id);
    }

    let stats = mgr.stats();
    assert_eq!(stats.total_allocated, 4096);
    assert_eq!(stats.block_count, 1);
    assert_eq!(stats.pools[0].committed_bytes, 4 * 4096);
    assert!(mgr.verify_accounting());
}
