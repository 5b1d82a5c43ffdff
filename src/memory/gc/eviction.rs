/*!
 * Eviction Ordering
 * Victim selection for unreferenced blocks under memory pressure
 */

use super::super::types::{Block, BlockId, Priority};
use crate::core::types::{Size, Tick};
use std::cmp::Ordering;

/// An allocated, unreferenced block eligible for reclaim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionCandidate {
    pub id: BlockId,
    pub priority: Priority,
    pub last_accessed: Tick,
    pub size: Size,
}

impl EvictionCandidate {
    /// Only blocks that are allocated with no holders qualify
    pub fn from_block(block: &Block) -> Option<Self> {
        block.is_cached().then(|| Self {
            id: block.id(),
            priority: block.priority(),
            last_accessed: block.last_accessed(),
            size: block.size(),
        })
    }
}

impl Ord for EvictionCandidate {
    /// Lowest priority rank first, then least recently touched
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .rank()
            .cmp(&other.priority.rank())
            .then(self.last_accessed.cmp(&other.last_accessed))
            .then(self.id.cmp(&other.id))
    }
}

impl PartialOrd for EvictionCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Eviction order for every candidate among `blocks`
pub fn select_victims<'a>(blocks: impl IntoIterator<Item = &'a Block>) -> Vec<EvictionCandidate> {
    let mut candidates: Vec<_> = blocks
        .into_iter()
        .filter_map(EvictionCandidate::from_block)
        .collect();
    candidates.sort_unstable();
    candidates
}
