/*!
 * Memory Module
 * Tiered block allocation, pooling, and eviction
 */

pub mod config;
pub mod gc;
mod governor;
pub mod manager;
mod pool;
mod registry;
pub mod shared;
pub mod traits;
pub mod transform;
pub mod types;

// Re-export for convenience
pub use config::{AllocatorConfig, ConfigError};
pub use gc::{EvictionCandidate, GcStats};
pub use manager::BlockManager;
pub use shared::SharedBlockManager;
pub use traits::*;
pub use transform::{TransformError, TransformOp, TransformOutcome, TransformTicket, Transformer};
pub use types::*;
