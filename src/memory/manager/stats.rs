/*!
 * Statistics and Maintenance
 * Reporting, free-list defragmentation, and teardown
 */

use super::super::types::{AllocStats, Category, PoolStats};
use super::BlockManager;
use crate::core::types::Size;
use log::{error, info};
use std::collections::BTreeMap;

impl BlockManager {
    /// Snapshot of allocator statistics
    pub fn stats(&self) -> AllocStats {
        let mut by_category = BTreeMap::new();
        let mut in_use = 0;
        let mut allocated_blocks = 0usize;
        let mut pooled_blocks = 0usize;

        for block in self.registry.iter().filter(|block| block.allocated) {
            *by_category.entry(block.category).or_insert(0) += block.size;
            allocated_blocks += 1;
            if block.ref_count > 0 {
                in_use += block.size;
            }
            if block.is_pooled() {
                pooled_blocks += 1;
            }
        }

        let (free_pooled, committed) = self.pools.fragmentation();
        let total = self.governor.total();

        AllocStats {
            total_allocated: total,
            in_use,
            free: self.config.global_limit.saturating_sub(total),
            limit: self.config.global_limit,
            by_category,
            fragmentation_ratio: ratio(free_pooled, committed),
            pool_hit_ratio: ratio(pooled_blocks, allocated_blocks),
            gc_runs: self.gc_runs,
            block_count: allocated_blocks,
            pools: self.pools.stats(),
        }
    }

    pub fn pool_stats(&self) -> Vec<PoolStats> {
        self.pools.stats()
    }

    /// Bytes allocated in one category
    pub fn category_usage(&self, category: Category) -> Size {
        self.governor.category_usage(category)
    }

    /// Recompute totals from the registry and compare with the running
    /// counters. Logs and returns false on any mismatch.
    pub fn verify_accounting(&self) -> bool {
        let mut consistent = true;

        let recomputed = self.registry.allocated_bytes();
        if recomputed != self.governor.total() {
            error!(
                "Accounting drift: registry holds {} allocated bytes, governor reports {}",
                recomputed,
                self.governor.total()
            );
            consistent = false;
        }

        for category in Category::ALL {
            let recomputed = self.registry.category_bytes(category);
            if recomputed != self.governor.category_usage(category) {
                error!(
                    "Accounting drift for {}: registry {} bytes, governor {}",
                    category,
                    recomputed,
                    self.governor.category_usage(category)
                );
                consistent = false;
            }
        }

        consistent
    }

    /// Reorder pool free lists for allocation locality
    ///
    /// Bookkeeping only: no buffer is moved or copied. Returns the number of
    /// free blocks reordered.
    pub fn defragment(&mut self) -> usize {
        let reordered = self.pools.defragment();
        profile!(self, "Defragmented pool free lists: {} free blocks ordered", reordered);
        reordered
    }

    /// Release every block and pool and reset totals, GC count, and clock
    ///
    /// Handle slots and transform sequence numbers keep counting, so handles
    /// and tickets issued before disposal never match a later block.
    pub fn dispose(&mut self) {
        let blocks = self.registry.len();
        let bytes = self.governor.total();

        self.registry.clear();
        self.pools.clear();
        self.governor.reset();
        self.gc_runs = 0;
        self.last_gc = None;
        self.clock = 0;

        info!("Block manager disposed: dropped {} blocks ({} bytes allocated)", blocks, bytes);
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
