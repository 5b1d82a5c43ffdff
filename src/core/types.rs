/*!
 * Core Types
 * Common types used across the allocator
 */

/// Size type for byte counts and block capacities
pub type Size = usize;

/// Logical clock value used for recency ordering (never wall-clock time)
pub type Tick = u64;

/// Monotonic sequence number tagging an in-flight transform
pub type TransformSeq = u64;
