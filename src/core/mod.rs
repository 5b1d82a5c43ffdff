/*!
 * Core Module
 * Shared types and allocator-wide limits
 */

pub mod limits;
pub mod types;

pub use types::{Size, Tick, TransformSeq};
