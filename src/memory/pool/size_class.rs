/*!
 * Size-Class Pool
 * Free and used lists for blocks of one fixed capacity
 */

use super::super::types::PoolStats;
use crate::core::limits::POOL_CLASS_SHARE_DIVISOR;
use crate::core::types::Size;
use ahash::RandomState;
use std::collections::{HashSet, VecDeque};

/// Pool for one size class
///
/// Holds registry slots only; block metadata lives in the registry.
#[derive(Debug)]
pub(crate) struct SizeClassPool {
    block_size: Size,
    max_blocks: usize,
    free: VecDeque<u64>,
    used: HashSet<u64, RandomState>,
}

impl SizeClassPool {
    /// Each class may commit at most a tenth of the global limit
    pub fn new(block_size: Size, global_limit: Size) -> Self {
        let max_blocks = block_size
            .checked_mul(POOL_CLASS_SHARE_DIVISOR)
            .map_or(0, |share| global_limit / share);

        Self {
            block_size,
            max_blocks,
            free: VecDeque::new(),
            used: HashSet::default(),
        }
    }

    pub fn block_size(&self) -> Size {
        self.block_size
    }

    pub fn max_blocks(&self) -> usize {
        self.max_blocks
    }

    pub fn block_count(&self) -> usize {
        self.free.len() + self.used.len()
    }

    pub fn is_full(&self) -> bool {
        self.block_count() >= self.max_blocks
    }

    /// A request can be served by reuse or by growing the pool
    pub fn can_serve(&self) -> bool {
        !self.free.is_empty() || !self.is_full()
    }

    pub fn pop_free(&mut self) -> Option<u64> {
        self.free.pop_front()
    }

    pub fn mark_used(&mut self, slot: u64) {
        self.used.insert(slot);
    }

    /// Move a slot from the used list to the free list
    pub fn mark_free(&mut self, slot: u64) -> bool {
        if self.used.remove(&slot) {
            self.free.push_back(slot);
            true
        } else {
            false
        }
    }

    /// Drop a slot from the pool altogether
    pub fn forget(&mut self, slot: u64) -> bool {
        if self.used.remove(&slot) {
            return true;
        }
        match self.free.iter().position(|&s| s == slot) {
            Some(pos) => {
                self.free.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Order the free list by slot so the oldest storage is reused first
    pub fn sort_free(&mut self) -> usize {
        self.free.make_contiguous().sort_unstable();
        self.free.len()
    }

    pub fn free_bytes(&self) -> Size {
        self.free.len() * self.block_size
    }

    pub fn committed_bytes(&self) -> Size {
        self.block_count() * self.block_size
    }

    pub fn clear(&mut self) {
        self.free.clear();
        self.used.clear();
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            block_size: self.block_size,
            max_blocks: self.max_blocks,
            free_blocks: self.free.len(),
            used_blocks: self.used.len(),
            committed_bytes: self.committed_bytes(),
        }
    }
}
