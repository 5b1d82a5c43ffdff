/*!
 * Memory Traits
 * Allocator abstractions
 */

use super::types::*;
use crate::core::types::Size;

/// Block allocation interface
pub trait Allocator {
    /// Allocate a block; fails without side effects when capacity is exhausted
    fn allocate(&mut self, request: AllocationRequest) -> AllocResult<BlockId>;

    /// Drop one reference; reclaims the block when none remain
    fn release(&mut self, id: BlockId) -> bool;

    /// Add a reference to an allocated block
    fn retain(&mut self, id: BlockId) -> bool;

    /// Check if a handle refers to an allocated block
    fn is_valid(&self, id: BlockId) -> bool;

    /// Get the current size of an allocated block
    fn block_size(&self, id: BlockId) -> Option<Size>;
}

/// Memory statistics provider
pub trait MemoryInfo {
    /// Get overall allocator statistics
    fn stats(&self) -> AllocStats;

    /// Get memory info as (limit, allocated, available)
    fn info(&self) -> (Size, Size, Size);

    /// Get memory pressure level
    fn pressure(&self) -> MemoryPressure {
        self.stats().memory_pressure()
    }
}

/// Garbage collection interface
pub trait GarbageCollector {
    /// Run one eviction pass, returning bytes freed
    fn collect(&mut self) -> Size;

    /// Check if usage is above the eviction threshold
    fn should_collect(&self) -> bool;
}
