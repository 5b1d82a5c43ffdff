/*!
 * Block Registry
 * Single source of truth for every block, pooled or not
 */

use super::types::{Block, BlockId, Category};
use crate::core::types::Size;
use ahash::RandomState;
use std::collections::HashMap;

/// Arena of blocks keyed by slot
///
/// Slots are handed out monotonically and never reused; lookups by `BlockId`
/// also check the generation so handles from a block's previous life miss.
#[derive(Debug, Default)]
pub(crate) struct BlockRegistry {
    blocks: HashMap<u64, Block, RandomState>,
    next_slot: u64,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the handle for a new block
    pub fn next_id(&mut self) -> BlockId {
        let slot = self.next_slot;
        self.next_slot += 1;
        BlockId::new(slot, 0)
    }

    pub fn insert(&mut self, block: Block) {
        self.blocks.insert(block.id.slot(), block);
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks
            .get(&id.slot())
            .filter(|block| block.id == id)
    }

    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks
            .get_mut(&id.slot())
            .filter(|block| block.id == id)
    }

    /// Slot lookup regardless of generation (pool bookkeeping)
    pub fn slot_mut(&mut self, slot: u64) -> Option<&mut Block> {
        self.blocks.get_mut(&slot)
    }

    pub fn remove(&mut self, id: BlockId) -> Option<Block> {
        if self.get(id).is_some() {
            self.blocks.remove(&id.slot())
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Drop every block; slot numbering keeps counting
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.blocks.shrink_to_fit();
    }

    /// Bytes held by allocated blocks, recomputed from scratch
    pub fn allocated_bytes(&self) -> Size {
        self.iter()
            .filter(|block| block.allocated)
            .map(|block| block.size)
            .sum()
    }

    /// Bytes held by allocated blocks of one category, recomputed from scratch
    pub fn category_bytes(&self, category: Category) -> Size {
        self.iter()
            .filter(|block| block.allocated && block.category == category)
            .map(|block| block.size)
            .sum()
    }
}
