/*!
 * Allocation Tests
 * Pooled and direct allocation under global and category ceilings
 */

use pretty_assertions::assert_eq;
use tiered_alloc::{
    AllocError, AllocationRequest, AllocatorConfig, BlockManager, Category, MedicalContext,
    Priority,
};

fn manager(config: AllocatorConfig) -> BlockManager {
    BlockManager::new(config).expect("valid config")
}

#[test]
fn test_pooled_then_direct_then_out_of_memory() {
    let mut mgr = manager(AllocatorConfig::unconstrained(1_000_000).with_size_classes(vec![100_000]));

    // One 100_000 block fits the class budget of 1_000_000 / (100_000 * 10)
    let pooled = mgr
        .allocate(60_000, Category::Buffer, Priority::Medium, None)
        .unwrap();
    assert_eq!(mgr.total_allocated(), 100_000);
    assert_eq!(mgr.peek(pooled).map(|b| b.size()), Some(100_000));
    assert!(mgr.peek(pooled).unwrap().is_pooled());

    let direct = mgr
        .allocate(50_000, Category::Buffer, Priority::Medium, None)
        .unwrap();
    assert_eq!(mgr.total_allocated(), 150_000);
    assert!(!mgr.peek(direct).unwrap().is_pooled());

    let err = mgr
        .allocate(900_000, Category::Buffer, Priority::Medium, None)
        .unwrap_err();
    assert!(matches!(err, AllocError::GlobalLimitExceeded { requested: 900_000, .. }));
    assert_eq!(mgr.total_allocated(), 150_000);
    assert_eq!(mgr.gc_runs(), 1);
}

#[test]
fn test_zero_size_rejected() {
    let mut mgr = manager(AllocatorConfig::unconstrained(1000).with_pooling(false));

    let err = mgr.allocate(0, Category::Other, Priority::Low, None).unwrap_err();
    assert_eq!(err, AllocError::ZeroSize);
    assert_eq!(mgr.total_allocated(), 0);
    assert_eq!(mgr.gc_runs(), 0);
}

#[test]
fn test_pooling_disabled_allocates_exact_size() {
    let mut mgr = manager(AllocatorConfig::unconstrained(1_000_000).with_pooling(false));

    let id = mgr.allocate(1234, Category::Geometry, Priority::Low, None).unwrap();
    let block = mgr.peek(id).unwrap();
    assert_eq!(block.size(), 1234);
    assert!(!block.is_pooled());
    assert_eq!(block.ref_count(), 1);
    assert_eq!(mgr.stats().pool_hit_ratio, 0.0);
}

#[test]
fn test_request_larger_than_every_class_is_direct() {
    let mut mgr =
        manager(AllocatorConfig::unconstrained(10_000_000).with_size_classes(vec![1024, 4096]));

    let id = mgr.allocate(5000, Category::Buffer, Priority::Medium, None).unwrap();
    assert_eq!(mgr.peek(id).map(|b| b.size()), Some(5000));
    assert_eq!(mgr.peek(id).and_then(|b| b.pool_class()), None);
}

#[test]
fn test_smallest_fitting_class_is_chosen() {
    let mut mgr = manager(
        AllocatorConfig::unconstrained(10_000_000).with_size_classes(vec![16_384, 1024, 4096]),
    );

    let id = mgr.allocate(1025, Category::Buffer, Priority::Medium, None).unwrap();
    assert_eq!(mgr.peek(id).and_then(|b| b.pool_class()), Some(4096));

    let exact = mgr.allocate(1024, Category::Buffer, Priority::Medium, None).unwrap();
    assert_eq!(mgr.peek(exact).and_then(|b| b.pool_class()), Some(1024));
}

#[test]
fn test_category_ceiling_rejects_without_eviction() {
    let mut mgr = manager(
        AllocatorConfig::unconstrained(1_000_000)
            .with_pooling(false)
            .with_category_limit(Category::Texture, 250_000),
    );

    mgr.allocate(200_000, Category::Texture, Priority::Medium, None).unwrap();
    let err = mgr
        .allocate(60_000, Category::Texture, Priority::Medium, None)
        .unwrap_err();

    assert_eq!(
        err,
        AllocError::CategoryLimitExceeded {
            category: Category::Texture,
            requested: 60_000,
            used: 200_000,
            limit: 250_000,
        }
    );
    assert_eq!(mgr.gc_runs(), 0);

    // Other categories are unaffected
    mgr.allocate(700_000, Category::Geometry, Priority::Medium, None).unwrap();
    assert_eq!(mgr.category_usage(Category::Texture), 200_000);
    assert_eq!(mgr.category_usage(Category::Geometry), 700_000);
}

#[test]
fn test_pooled_class_counts_against_category_ceiling() {
    let mut mgr = manager(
        AllocatorConfig::unconstrained(10_000_000)
            .with_size_classes(vec![100_000])
            .with_category_limit(Category::Texture, 150_000),
    );

    mgr.allocate(10, Category::Texture, Priority::Medium, None).unwrap();
    assert_eq!(mgr.category_usage(Category::Texture), 100_000);

    // A second class block would overflow the ceiling; the exact-size
    // fallback still fits
    let id = mgr.allocate(40_000, Category::Texture, Priority::Medium, None).unwrap();
    assert_eq!(mgr.peek(id).map(|b| b.size()), Some(40_000));
    assert_eq!(mgr.category_usage(Category::Texture), 140_000);
}

#[test]
fn test_global_failure_evicts_cached_block_and_retries() {
    let mut mgr = manager(AllocatorConfig::unconstrained(1000).with_pooling(false));

    let cached = mgr.allocate(900, Category::Buffer, Priority::Low, None).unwrap();
    assert!(mgr.unpin(cached));

    let id = mgr.allocate(500, Category::Buffer, Priority::Medium, None).unwrap();

    assert!(mgr.peek(cached).is_none());
    assert!(mgr.peek(id).is_some());
    assert_eq!(mgr.total_allocated(), 500);
    assert_eq!(mgr.gc_runs(), 1);
    assert_eq!(mgr.last_gc().map(|gc| gc.freed_bytes), Some(900));
}

#[test]
fn test_failed_allocation_evicts_only_to_threshold() {
    let mut mgr = manager(AllocatorConfig::unconstrained(1000).with_pooling(false));

    let a = mgr.allocate(300, Category::Buffer, Priority::Low, None).unwrap();
    let b = mgr.allocate(300, Category::Buffer, Priority::Low, None).unwrap();
    let c = mgr.allocate(300, Category::Buffer, Priority::High, None).unwrap();
    mgr.unpin(a);
    mgr.unpin(b);

    // 900 -> 600 meets the 800 byte target, which still leaves no room for 500
    let err = mgr
        .allocate(500, Category::Buffer, Priority::Medium, None)
        .unwrap_err();

    assert!(matches!(err, AllocError::GlobalLimitExceeded { .. }));
    assert!(mgr.peek(a).is_none());
    assert!(mgr.peek(b).is_some());
    assert!(mgr.peek(c).is_some());
    assert_eq!(mgr.total_allocated(), 600);
    assert_eq!(mgr.gc_runs(), 1);

    let gc = mgr.last_gc().unwrap();
    assert_eq!((gc.freed_bytes, gc.freed_blocks, gc.target), (300, 1, 800));
    assert!(gc.reached_target);
    assert!(mgr.verify_accounting());
}

#[test]
fn test_held_blocks_survive_failed_allocation() {
    let mut mgr = manager(AllocatorConfig::unconstrained(1000).with_pooling(false));

    let held = mgr.allocate(600, Category::Buffer, Priority::Low, None).unwrap();
    let err = mgr
        .allocate(500, Category::Buffer, Priority::Critical, None)
        .unwrap_err();

    assert!(matches!(err, AllocError::GlobalLimitExceeded { .. }));
    assert_eq!(mgr.peek(held).map(|b| b.ref_count()), Some(1));
    assert_eq!(mgr.gc_runs(), 1);
    assert!(mgr.verify_accounting());
}

#[test]
fn test_context_kept_only_for_medical_data() {
    let mut mgr = manager(AllocatorConfig::unconstrained(1_000_000).with_pooling(false));

    let medical = mgr
        .allocate_request(
            AllocationRequest::new(100, Category::MedicalData)
                .with_priority(Priority::High)
                .with_context(MedicalContext::new("1.2.3").with_series("1.2.3.4")),
        )
        .unwrap();
    let texture = mgr
        .allocate(100, Category::Texture, Priority::High, Some(MedicalContext::new("1.2.3")))
        .unwrap();

    let ctx = mgr.peek(medical).and_then(|b| b.context()).cloned().unwrap();
    assert_eq!(ctx.study_id, "1.2.3");
    assert_eq!(ctx.series_id.as_deref(), Some("1.2.3.4"));
    assert!(mgr.peek(texture).unwrap().context().is_none());
}

#[test]
fn test_invalid_config_is_refused() {
    assert!(BlockManager::new(AllocatorConfig::unconstrained(0)).is_err());
    assert!(BlockManager::new(AllocatorConfig::default().with_size_classes(Vec::new())).is_err());
    assert!(BlockManager::new(
        AllocatorConfig::default()
            .with_size_classes(Vec::new())
            .with_pooling(false)
    )
    .is_ok());
}
