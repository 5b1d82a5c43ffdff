/*!
 * Block Allocation
 * Pooled-then-direct allocation with a single eviction retry
 */

use super::super::types::{
    AllocError, AllocResult, AllocationRequest, Block, BlockId, Category, MedicalContext,
    MemoryPressure, Priority,
};
use super::BlockManager;
use crate::core::types::Size;
use log::{debug, warn};

impl BlockManager {
    /// Allocate a block of at least `size` bytes
    ///
    /// `context` is kept only for `Category::MedicalData` blocks.
    pub fn allocate(
        &mut self,
        size: Size,
        category: Category,
        priority: Priority,
        context: Option<MedicalContext>,
    ) -> AllocResult<BlockId> {
        self.allocate_request(AllocationRequest {
            size,
            category,
            priority,
            context,
        })
    }

    /// Allocate from a prepared request
    ///
    /// A global-ceiling failure triggers exactly one eviction pass down to the
    /// GC threshold and one retry, which may still fail. Category-ceiling
    /// failures are returned immediately.
    pub fn allocate_request(&mut self, request: AllocationRequest) -> AllocResult<BlockId> {
        if request.size == 0 {
            return Err(AllocError::ZeroSize);
        }

        let result = match self.try_allocate(&request) {
            Err(AllocError::GlobalLimitExceeded { .. }) => {
                let target = self.config.gc_target();
                debug!(
                    "Global limit hit for {} byte {} request, evicting down to {} bytes",
                    request.size, request.category, target
                );
                self.evict_to(target);
                self.try_allocate(&request)
            }
            other => other,
        };

        match &result {
            Ok(id) => self.warn_on_pressure(*id),
            Err(e) => warn!(
                "Allocation of {} bytes ({}, {}) failed: {}",
                request.size, request.category, request.priority, e
            ),
        }

        result
    }

    /// One allocation attempt: pooled when a class fits and admits it,
    /// otherwise direct. No state changes on failure.
    fn try_allocate(&mut self, request: &AllocationRequest) -> AllocResult<BlockId> {
        if self.config.pooling {
            if let Some(idx) = self.pools.class_for(request.size) {
                let class_size = self.pools.class_size(idx);
                if self.pools.can_serve(idx)
                    && self.governor.can_allocate(class_size, request.category)
                {
                    let tick = self.clock + 1;
                    if let Some(id) = self.pools.acquire(idx, &mut self.registry, request, tick) {
                        self.clock = tick;
                        self.governor.record_allocation(class_size, request.category);
                        profile!(
                            self,
                            "Pooled {} for {} byte {} request (class {} bytes, {} priority)",
                            id,
                            request.size,
                            request.category,
                            class_size,
                            request.priority
                        );
                        return Ok(id);
                    }
                }
            }
        }

        self.governor.check(request.size, request.category)?;

        let tick = self.tick();
        let id = self.registry.next_id();
        self.registry.insert(Block::direct(id, request, tick));
        self.governor.record_allocation(request.size, request.category);

        profile!(
            self,
            "Allocated direct {} ({} bytes, {}, {} priority)",
            id,
            request.size,
            request.category,
            request.priority
        );
        Ok(id)
    }

    fn warn_on_pressure(&self, id: BlockId) {
        let used = self.governor.total();
        let ratio = used as f64 / self.config.global_limit as f64;
        let level = MemoryPressure::from_ratio(ratio);
        if level >= MemoryPressure::High {
            warn!(
                "Memory pressure {} after allocating {}: {:.1}% used ({} / {})",
                level,
                id,
                ratio * 100.0,
                used,
                self.config.global_limit
            );
        }
    }
}
