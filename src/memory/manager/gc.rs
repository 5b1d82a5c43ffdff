/*!
 * Block Manager Garbage Collection
 * Eviction passes over unreferenced blocks
 */

use super::super::gc::{select_victims, GcStats};
use super::BlockManager;
use crate::core::types::Size;
use log::info;
use std::time::Instant;

impl BlockManager {
    /// Run one eviction pass down to `global_limit * gc_threshold`
    ///
    /// Returns bytes freed. Blocks with holders are never touched, so the pass
    /// may end above the target.
    pub fn run_eviction(&mut self) -> Size {
        let target = self.config.gc_target();
        self.evict_to(target).freed_bytes
    }

    /// Check if usage is above the eviction target
    pub fn should_collect(&self) -> bool {
        self.governor.total() > self.config.gc_target()
    }

    /// Reclaim candidates, lowest priority and least recent first, until the
    /// allocated total is at or below `target`
    pub(super) fn evict_to(&mut self, target: Size) -> GcStats {
        let start = Instant::now();
        let victims = select_victims(self.registry.iter());

        let mut stats = GcStats {
            candidates: victims.len(),
            target,
            ..GcStats::default()
        };

        for victim in &victims {
            if self.governor.total() <= target {
                break;
            }
            let freed = self.reclaim(victim.id);
            if freed > 0 {
                stats.freed_bytes += freed;
                stats.freed_blocks += 1;
            }
        }

        stats.reached_target = self.governor.total() <= target;
        stats.duration_us = start.elapsed().as_micros() as u64;
        self.gc_runs += 1;

        info!(
            "Eviction pass #{}: freed {} bytes ({} of {} candidates), {} bytes allocated, target {} {}",
            self.gc_runs,
            stats.freed_bytes,
            stats.freed_blocks,
            stats.candidates,
            self.governor.total(),
            target,
            if stats.reached_target { "reached" } else { "not reached" }
        );

        self.last_gc = Some(stats.clone());
        stats
    }
}
