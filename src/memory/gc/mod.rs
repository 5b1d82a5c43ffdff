/*!
 * Garbage Collection
 * Priority-then-recency eviction of unreferenced blocks
 */

pub mod eviction;

pub use eviction::{select_victims, EvictionCandidate};

use crate::core::types::Size;
use serde::{Deserialize, Serialize};

/// Outcome of one eviction pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GcStats {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub freed_bytes: Size,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub freed_blocks: usize,
    pub candidates: usize,
    pub target: Size,
    pub reached_target: bool,
    #[serde(default)]
    pub duration_us: u64,
}

impl GcStats {
    /// Check if any memory was freed
    pub fn freed_any(&self) -> bool {
        self.freed_bytes > 0 || self.freed_blocks > 0
    }
}

fn is_zero(value: &Size) -> bool {
    *value == 0
}
