/*!
 * Pool Manager
 *
 * Routes requests to the smallest size class that fits:
 * - **Pool hit**: a free block of that class is reborn for the new owner
 * - **Pool growth**: a new block of exactly the class size is created while
 *   the class is below its cap
 * - **Pool miss**: class at capacity with nothing free; the caller falls back
 *   to a direct allocation
 */

mod size_class;

pub(crate) use size_class::SizeClassPool;

use super::registry::BlockRegistry;
use super::types::{AllocationRequest, Block, BlockId, PoolStats};
use crate::core::types::{Size, Tick};
use log::error;

/// Ordered set of size-class pools
#[derive(Debug)]
pub(crate) struct PoolManager {
    pools: Vec<SizeClassPool>,
}

impl PoolManager {
    /// Classes are sorted ascending here, once
    pub fn new(size_classes: &[Size], global_limit: Size) -> Self {
        let mut classes = size_classes.to_vec();
        classes.sort_unstable();
        classes.dedup();

        Self {
            pools: classes
                .into_iter()
                .map(|size| SizeClassPool::new(size, global_limit))
                .collect(),
        }
    }

    /// Index of the smallest class that holds `size` bytes
    pub fn class_for(&self, size: Size) -> Option<usize> {
        let idx = self.pools.partition_point(|pool| pool.block_size() < size);
        (idx < self.pools.len()).then_some(idx)
    }

    pub fn class_size(&self, idx: usize) -> Size {
        self.pools[idx].block_size()
    }

    pub fn can_serve(&self, idx: usize) -> bool {
        self.pools[idx].can_serve()
    }

    /// Hand out a block from class `idx`, reusing a free one when possible
    pub fn acquire(
        &mut self,
        idx: usize,
        registry: &mut BlockRegistry,
        request: &AllocationRequest,
        tick: Tick,
    ) -> Option<BlockId> {
        let pool = &mut self.pools[idx];

        while let Some(slot) = pool.pop_free() {
            match registry.slot_mut(slot) {
                Some(block) => {
                    block.rebirth(request, tick);
                    pool.mark_used(slot);
                    return Some(block.id());
                }
                None => {
                    error!(
                        "Pool {} free list referenced missing slot {} - dropping it",
                        pool.block_size(),
                        slot
                    );
                }
            }
        }

        if pool.is_full() {
            return None;
        }

        let id = registry.next_id();
        registry.insert(Block::pooled(id, pool.block_size(), request, tick));
        pool.mark_used(id.slot());
        Some(id)
    }

    /// Park a released pooled block on its class free list
    pub fn recycle(&mut self, block: &mut Block) -> bool {
        let Some(pool) = self.pool_for_mut(block) else {
            return false;
        };
        if pool.mark_free(block.id().slot()) {
            block.clear_for_pool();
            true
        } else {
            false
        }
    }

    /// Remove a block from its pool; it becomes a direct block
    pub fn detach(&mut self, block: &mut Block) -> bool {
        let detached = self
            .pool_for_mut(block)
            .is_some_and(|pool| pool.forget(block.id().slot()));
        block.pool_class = None;
        detached
    }

    fn pool_for_mut(&mut self, block: &Block) -> Option<&mut SizeClassPool> {
        let class = block.pool_class()?;
        self.pools.iter_mut().find(|pool| pool.block_size() == class)
    }

    /// Sort every free list by slot; live blocks are untouched
    pub fn defragment(&mut self) -> usize {
        self.pools.iter_mut().map(SizeClassPool::sort_free).sum()
    }

    /// (bytes idle on free lists, bytes committed to pools)
    pub fn fragmentation(&self) -> (Size, Size) {
        self.pools.iter().fold((0, 0), |(free, committed), pool| {
            (free + pool.free_bytes(), committed + pool.committed_bytes())
        })
    }

    pub fn clear(&mut self) {
        for pool in &mut self.pools {
            pool.clear();
        }
    }

    pub fn stats(&self) -> Vec<PoolStats> {
        self.pools.iter().map(SizeClassPool::stats).collect()
    }
}
