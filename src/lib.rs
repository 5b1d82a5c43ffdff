/*!
 * Tiered Allocator Library
 * Size-class pooled, reference-counted buffer management under a memory ceiling
 */

pub mod core;
pub mod memory;
pub mod monitoring;

// Re-exports
pub use memory::{
    AllocError, AllocResult, AllocStats, AllocatorConfig, AllocationRequest, Block, BlockId,
    BlockManager, Category, ClinicalPriority, ConfigError, MedicalContext, MemoryPressure,
    Priority, SharedBlockManager, TransformError, TransformOp, Transformer,
};
pub use monitoring::init_tracing;
