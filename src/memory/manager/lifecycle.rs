/*!
 * Reference Lifecycle
 * Lookup, reference counting, and reclaim of blocks
 */

use super::super::types::{Block, BlockId};
use super::BlockManager;
use crate::core::types::Size;

impl BlockManager {
    /// Get an allocated block and mark it as the most recently used
    pub fn get(&mut self, id: BlockId) -> Option<&Block> {
        if self.peek(id).is_none() {
            return None;
        }
        let tick = self.tick();
        let block = self.registry.get_mut(id)?;
        block.last_accessed = tick;
        Some(&*block)
    }

    /// Get an allocated block without touching its recency
    pub fn peek(&self, id: BlockId) -> Option<&Block> {
        self.registry.get(id).filter(|block| block.allocated)
    }

    /// Add a holder to an allocated block (also re-pins a cached block)
    pub fn increment_ref(&mut self, id: BlockId) -> bool {
        match self.registry.get_mut(id) {
            Some(block) if block.allocated => {
                block.ref_count += 1;
                true
            }
            _ => false,
        }
    }

    /// Drop a holder; at zero the block is recycled into its pool or destroyed
    ///
    /// Returns false without side effects for unknown handles and for blocks
    /// already at zero references.
    pub fn release(&mut self, id: BlockId) -> bool {
        if !self.drop_ref(id) {
            return false;
        }
        if self.registry.get(id).is_some_and(|block| block.ref_count == 0) {
            self.reclaim(id);
        }
        true
    }

    /// Drop a holder but keep the block allocated as an evictable cache entry
    /// when no holders remain
    pub fn unpin(&mut self, id: BlockId) -> bool {
        if !self.drop_ref(id) {
            return false;
        }
        if let Some(block) = self.registry.get(id).filter(|block| block.ref_count == 0) {
            profile!(
                self,
                "{} unpinned, cached as evictable ({} bytes, {} priority)",
                id,
                block.size,
                block.priority
            );
        }
        true
    }

    fn drop_ref(&mut self, id: BlockId) -> bool {
        match self.registry.get_mut(id) {
            Some(block) if block.allocated && block.ref_count > 0 => {
                block.ref_count -= 1;
                true
            }
            _ => false,
        }
    }

    /// Release an allocated block regardless of its reference count.
    /// Returns bytes released from the accounting.
    pub(super) fn reclaim(&mut self, id: BlockId) -> Size {
        let Some(block) = self.registry.get_mut(id).filter(|block| block.allocated) else {
            return 0;
        };

        let size = block.size;
        let category = block.category;
        self.governor.record_release(size, category);

        if block.is_pooled() && self.pools.recycle(block) {
            profile!(self, "Recycled {} ({} bytes) into its pool", id, size);
        } else {
            self.registry.remove(id);
            profile!(self, "Destroyed {} ({} bytes, {})", id, size, category);
        }

        size
    }
}
