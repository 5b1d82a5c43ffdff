/*!
 * Property Tests
 * Accounting and safety invariants over random operation sequences
 */

use proptest::prelude::*;
use tiered_alloc::{
    AllocatorConfig, BlockId, BlockManager, Category, MedicalContext, Priority,
};

const LIMIT: usize = 200_000;
const TEXTURE_LIMIT: usize = 60_000;
const STUDIES: [&str; 2] = ["study-a", "study-b"];

#[derive(Debug, Clone)]
enum Op {
    Alloc {
        size: usize,
        category: usize,
        priority: usize,
        study: usize,
    },
    Release(usize),
    Unpin(usize),
    Retain(usize),
    Get(usize),
    Evict,
    Defragment,
    ReleaseStudy(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (1usize..40_000, 0usize..6, 0usize..4, 0usize..2).prop_map(
            |(size, category, priority, study)| Op::Alloc {
                size,
                category,
                priority,
                study,
            }
        ),
        2 => any::<usize>().prop_map(Op::Release),
        2 => any::<usize>().prop_map(Op::Unpin),
        1 => any::<usize>().prop_map(Op::Retain),
        2 => any::<usize>().prop_map(Op::Get),
        1 => Just(Op::Evict),
        1 => Just(Op::Defragment),
        1 => (0usize..2).prop_map(Op::ReleaseStudy),
    ]
}

fn manager() -> BlockManager {
    BlockManager::new(
        AllocatorConfig::unconstrained(LIMIT)
            .with_size_classes(vec![1024, 8192, 32_768])
            .with_category_limit(Category::Texture, TEXTURE_LIMIT)
            .with_gc_threshold(0.5),
    )
    .expect("valid config")
}

fn pick(ids: &[BlockId], idx: usize) -> Option<BlockId> {
    (!ids.is_empty()).then(|| ids[idx % ids.len()])
}

const PRIORITIES: [Priority; 4] = [
    Priority::Low,
    Priority::Medium,
    Priority::High,
    Priority::Critical,
];

fn check_invariants(mgr: &BlockManager) -> Result<(), TestCaseError> {
    prop_assert!(mgr.verify_accounting());

    let stats = mgr.stats();
    prop_assert!(stats.total_allocated <= LIMIT);
    prop_assert!(mgr.category_usage(Category::Texture) <= TEXTURE_LIMIT);
    prop_assert!(stats.in_use <= stats.total_allocated);
    for pool in &stats.pools {
        prop_assert!(pool.free_blocks + pool.used_blocks <= pool.max_blocks);
    }
    Ok(())
}

proptest! {
    #[test]
    fn prop_invariants_hold(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let mut mgr = manager();
        let mut ids: Vec<BlockId> = Vec::new();

        for op in ops {
            match op {
                Op::Alloc { size, category, priority, study } => {
                    let category = Category::ALL[category];
                    let context = Some(MedicalContext::new(STUDIES[study]));
                    if let Ok(id) = mgr.allocate(size, category, PRIORITIES[priority], context) {
                        let block = mgr.peek(id).expect("fresh block is allocated");
                        prop_assert!(block.size() >= size);
                        prop_assert_eq!(block.ref_count(), 1);
                        ids.push(id);
                    }
                }
                Op::Release(idx) => {
                    if let Some(id) = pick(&ids, idx) {
                        let before = mgr.total_allocated();
                        let live = mgr.peek(id).map(|b| b.ref_count());
                        let released = mgr.release(id);
                        prop_assert_eq!(released, live.is_some_and(|holders| holders > 0));
                        if !released {
                            prop_assert_eq!(mgr.total_allocated(), before);
                        }
                    }
                }
                Op::Unpin(idx) => {
                    if let Some(id) = pick(&ids, idx) {
                        let before = mgr.total_allocated();
                        mgr.unpin(id);
                        prop_assert_eq!(mgr.total_allocated(), before);
                    }
                }
                Op::Retain(idx) => {
                    if let Some(id) = pick(&ids, idx) {
                        let live = mgr.peek(id).is_some();
                        prop_assert_eq!(mgr.increment_ref(id), live);
                    }
                }
                Op::Get(idx) => {
                    if let Some(id) = pick(&ids, idx) {
                        let before = mgr.peek(id).map(|b| b.last_accessed());
                        let after = mgr.get(id).map(|b| b.last_accessed());
                        match (before, after) {
                            (Some(before), Some(after)) => {
                                prop_assert!(after > before);
                                prop_assert_eq!(after, mgr.clock());
                            }
                            (None, None) => {}
                            other => prop_assert!(false, "get/peek disagree: {:?}", other),
                        }
                    }
                }
                Op::Evict => {
                    let held: Vec<BlockId> = ids
                        .iter()
                        .copied()
                        .filter(|&id| mgr.peek(id).is_some_and(|b| b.ref_count() > 0))
                        .collect();
                    let runs = mgr.gc_runs();

                    mgr.run_eviction();

                    prop_assert_eq!(mgr.gc_runs(), runs + 1);
                    for id in held {
                        prop_assert!(mgr.peek(id).is_some());
                    }
                }
                Op::Defragment => {
                    let before = mgr.stats();
                    mgr.defragment();
                    let after = mgr.stats();
                    prop_assert_eq!(after.total_allocated, before.total_allocated);
                    prop_assert_eq!(after.block_count, before.block_count);
                }
                Op::ReleaseStudy(study) => {
                    let before = mgr.total_allocated();
                    let freed = mgr.release_by_context(STUDIES[study]);
                    prop_assert_eq!(mgr.total_allocated(), before - freed);
                }
            }

            check_invariants(&mgr)?;
        }
    }

    #[test]
    fn prop_full_drain_spares_held_blocks(
        blocks in prop::collection::vec((1usize..10_000, 0usize..4), 2..20)
    ) {
        let mut mgr = BlockManager::new(
            AllocatorConfig::unconstrained(1_000_000)
                .with_pooling(false)
                .with_gc_threshold(0.0),
        )
        .expect("valid config");

        let ids: Vec<BlockId> = blocks
            .iter()
            .map(|&(size, priority)| {
                mgr.allocate(size, Category::Buffer, PRIORITIES[priority], None)
                    .expect("fits under limit")
            })
            .collect();

        // Cache only the second half; the first half keeps its holder
        let (held, cached) = ids.split_at(ids.len() / 2);
        for id in cached {
            mgr.unpin(*id);
        }

        mgr.run_eviction();

        for id in held {
            prop_assert!(mgr.peek(*id).is_some());
        }
        for id in cached {
            prop_assert!(mgr.peek(*id).is_none());
        }
        prop_assert_eq!(mgr.last_gc().map(|gc| gc.freed_blocks), Some(cached.len()));
    }
}
