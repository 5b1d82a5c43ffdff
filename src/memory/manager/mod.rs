/*!
 * Block Manager
 *
 * Tiered allocator for large binary buffers under a hard memory ceiling.
 *
 * ## Allocation path
 *
 * 1. The **capacity governor** checks the global ceiling and, for capped
 *    categories, the category ceiling
 * 2. The **pool manager** serves the request from the smallest size class
 *    that fits (reuse a free block, or grow the class up to its cap)
 * 3. On a pool miss a **direct** block of exactly the requested size is
 *    registered
 * 4. If the global ceiling would be exceeded, one **eviction pass** runs and
 *    the attempt is retried exactly once
 *
 * ## Lifetime
 *
 * Blocks are reference counted. At zero a block is either parked on its
 * pool's free list or destroyed. `unpin` keeps an unreferenced block
 * allocated as a cache entry; those are the only eviction candidates.
 *
 * All state is owned by one `BlockManager` value and mutated through
 * `&mut self`. See `SharedBlockManager` for interleaving async transforms.
 */

/// Log at info when profiling is enabled, debug otherwise
macro_rules! profile {
    ($manager:expr, $($arg:tt)+) => {
        if $manager.config.profiling {
            log::info!($($arg)+)
        } else {
            log::debug!($($arg)+)
        }
    };
}

mod allocator;
mod context;
mod gc;
mod lifecycle;
mod stats;
mod storage;
mod transform;

use super::config::{AllocatorConfig, ConfigError};
use super::governor::CapacityGovernor;
use super::gc::GcStats;
use super::pool::PoolManager;
use super::registry::BlockRegistry;
use super::traits::{Allocator, GarbageCollector, MemoryInfo};
use super::types::{AllocResult, AllocStats, AllocationRequest, BlockId};
use crate::core::types::{Size, Tick, TransformSeq};
use log::info;

/// Tiered block allocator
#[derive(Debug)]
pub struct BlockManager {
    pub(super) config: AllocatorConfig,
    pub(super) registry: BlockRegistry,
    pub(super) pools: PoolManager,
    pub(super) governor: CapacityGovernor,
    pub(super) gc_runs: u64,
    pub(super) last_gc: Option<GcStats>,
    pub(super) clock: Tick,
    pub(super) transform_seq: TransformSeq,
}

impl BlockManager {
    /// Create a manager; misconfiguration is refused here rather than
    /// silently degrading (e.g. pooling without size classes)
    pub fn new(config: AllocatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        info!(
            "Block manager initialized: {} byte limit, {} size classes, pooling {}, gc threshold {:.2}",
            config.global_limit,
            config.size_classes.len(),
            if config.pooling { "on" } else { "off" },
            config.gc_threshold
        );

        Ok(Self {
            registry: BlockRegistry::new(),
            pools: PoolManager::new(&config.size_classes, config.global_limit),
            governor: CapacityGovernor::new(&config),
            gc_runs: 0,
            last_gc: None,
            clock: 0,
            transform_seq: 0,
            config,
        })
    }

    /// Create a manager with default configuration
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Self::new(AllocatorConfig::default())
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Current logical clock value
    pub fn clock(&self) -> Tick {
        self.clock
    }

    /// Advance the logical clock
    pub(super) fn tick(&mut self) -> Tick {
        self.clock += 1;
        self.clock
    }

    pub fn total_allocated(&self) -> Size {
        self.governor.total()
    }

    pub fn gc_runs(&self) -> u64 {
        self.gc_runs
    }

    /// Statistics of the most recent eviction pass
    pub fn last_gc(&self) -> Option<&GcStats> {
        self.last_gc.as_ref()
    }
}

impl Allocator for BlockManager {
    fn allocate(&mut self, request: AllocationRequest) -> AllocResult<BlockId> {
        self.allocate_request(request)
    }

    fn release(&mut self, id: BlockId) -> bool {
        BlockManager::release(self, id)
    }

    fn retain(&mut self, id: BlockId) -> bool {
        self.increment_ref(id)
    }

    fn is_valid(&self, id: BlockId) -> bool {
        self.peek(id).is_some()
    }

    fn block_size(&self, id: BlockId) -> Option<Size> {
        self.peek(id).map(|block| block.size())
    }
}

impl MemoryInfo for BlockManager {
    fn stats(&self) -> AllocStats {
        BlockManager::stats(self)
    }

    fn info(&self) -> (Size, Size, Size) {
        (
            self.governor.global_limit(),
            self.governor.total(),
            self.governor.available(),
        )
    }
}

impl GarbageCollector for BlockManager {
    fn collect(&mut self) -> Size {
        self.run_eviction()
    }

    fn should_collect(&self) -> bool {
        BlockManager::should_collect(self)
    }
}
