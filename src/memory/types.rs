/*!
 * Memory Types
 * Common types for block management
 */

use crate::core::limits::{PRESSURE_CRITICAL_RATIO, PRESSURE_HIGH_RATIO, PRESSURE_MEDIUM_RATIO};
use crate::core::types::{Size, Tick, TransformSeq};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Allocation operation result
pub type AllocResult<T> = Result<T, AllocError>;

/// Allocation errors
///
/// None of these are fatal: capacity exhaustion and stale handles are part of
/// normal operation under memory pressure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    #[error("Zero-sized allocation requested")]
    ZeroSize,

    #[error("Global limit exceeded: requested {requested} bytes, {used} of {limit} bytes allocated")]
    GlobalLimitExceeded {
        requested: Size,
        used: Size,
        limit: Size,
    },

    #[error("{category} limit exceeded: requested {requested} bytes, {used} of {limit} bytes allocated")]
    CategoryLimitExceeded {
        category: Category,
        requested: Size,
        used: Size,
        limit: Size,
    },

    #[error("Invalid or released block: {0}")]
    InvalidBlock(BlockId),

    #[error("Access out of bounds on {id}: offset {offset} + {len} bytes exceeds block size {size}")]
    OutOfBounds {
        id: BlockId,
        offset: Size,
        len: Size,
        size: Size,
    },

    #[error("Block {0} has a transform in flight")]
    TransformPending(BlockId),
}

/// Handle to a managed block
///
/// The slot is unique for the lifetime of the manager. The generation changes
/// every time a pooled block is handed out again, so a handle from a previous
/// life no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId {
    slot: u64,
    generation: u32,
}

impl BlockId {
    pub(crate) fn new(slot: u64, generation: u32) -> Self {
        Self { slot, generation }
    }

    pub fn slot(&self) -> u64 {
        self.slot
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub(crate) fn next_generation(self) -> Self {
        Self {
            slot: self.slot,
            generation: self.generation.wrapping_add(1),
        }
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blk#{}.{}", self.slot, self.generation)
    }
}

/// What a block holds; capped categories are accounted separately
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Texture,
    Buffer,
    MedicalData,
    Geometry,
    Shader,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Texture,
        Category::Buffer,
        Category::MedicalData,
        Category::Geometry,
        Category::Shader,
        Category::Other,
    ];

    /// Dense index for per-category tables
    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Texture => "texture",
            Category::Buffer => "buffer",
            Category::MedicalData => "medical_data",
            Category::Geometry => "geometry",
            Category::Shader => "shader",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Eviction priority supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Eviction rank: lower ranks are evicted first
    #[inline]
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Critical => 4,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "LOW"),
            Priority::Medium => write!(f, "MEDIUM"),
            Priority::High => write!(f, "HIGH"),
            Priority::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Clinical urgency of the study a block belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalPriority {
    Routine,
    Urgent,
    Stat,
}

/// Origin tag for medical-data blocks
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalContext {
    pub study_id: String,
    pub series_id: Option<String>,
    pub instance_id: Option<String>,
    pub clinical_priority: Option<ClinicalPriority>,
    pub compression_level: Option<u8>,
}

impl MedicalContext {
    pub fn new(study_id: impl Into<String>) -> Self {
        Self {
            study_id: study_id.into(),
            series_id: None,
            instance_id: None,
            clinical_priority: None,
            compression_level: None,
        }
    }

    pub fn with_series(mut self, series_id: impl Into<String>) -> Self {
        self.series_id = Some(series_id.into());
        self
    }

    pub fn with_instance(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = Some(instance_id.into());
        self
    }

    pub fn with_clinical_priority(mut self, priority: ClinicalPriority) -> Self {
        self.clinical_priority = Some(priority);
        self
    }

    pub fn with_compression_level(mut self, level: u8) -> Self {
        self.compression_level = Some(level);
        self
    }
}

/// Block allocation request
#[derive(Debug, Clone)]
pub struct AllocationRequest {
    pub size: Size,
    pub category: Category,
    pub priority: Priority,
    pub context: Option<MedicalContext>,
}

impl AllocationRequest {
    pub fn new(size: Size, category: Category) -> Self {
        Self {
            size,
            category,
            priority: Priority::default(),
            context: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_context(mut self, context: MedicalContext) -> Self {
        self.context = Some(context);
        self
    }
}

/// One managed byte buffer and its metadata
#[derive(Debug, Clone)]
pub struct Block {
    pub(crate) id: BlockId,
    pub(crate) category: Category,
    pub(crate) size: Size,
    pub(crate) buffer: Vec<u8>,
    pub(crate) ref_count: u32,
    pub(crate) last_accessed: Tick,
    pub(crate) priority: Priority,
    pub(crate) context: Option<MedicalContext>,
    pub(crate) pool_class: Option<Size>,
    pub(crate) allocated: bool,
    pub(crate) pending_transform: Option<TransformSeq>,
}

impl Block {
    /// Fresh one-off block sized exactly to the request
    pub(crate) fn direct(id: BlockId, request: &AllocationRequest, tick: Tick) -> Self {
        Self::with_capacity(id, request.size, None, request, tick)
    }

    /// Fresh block owned by the size class `class_size`
    pub(crate) fn pooled(
        id: BlockId,
        class_size: Size,
        request: &AllocationRequest,
        tick: Tick,
    ) -> Self {
        Self::with_capacity(id, class_size, Some(class_size), request, tick)
    }

    fn with_capacity(
        id: BlockId,
        size: Size,
        pool_class: Option<Size>,
        request: &AllocationRequest,
        tick: Tick,
    ) -> Self {
        Self {
            id,
            category: request.category,
            size,
            buffer: vec![0u8; size],
            ref_count: 1,
            last_accessed: tick,
            priority: request.priority,
            context: scoped_context(request),
            pool_class,
            allocated: true,
            pending_transform: None,
        }
    }

    /// Hand a recycled pooled block to a new owner under a new generation
    pub(crate) fn rebirth(&mut self, request: &AllocationRequest, tick: Tick) {
        self.id = self.id.next_generation();
        self.category = request.category;
        self.priority = request.priority;
        self.context = scoped_context(request);
        self.ref_count = 1;
        self.last_accessed = tick;
        self.allocated = true;
        self.pending_transform = None;
        self.buffer.fill(0);
    }

    /// Clear semantic fields and park the block on its pool's free list
    pub(crate) fn clear_for_pool(&mut self) {
        self.category = Category::Other;
        self.priority = Priority::default();
        self.context = None;
        self.ref_count = 0;
        self.allocated = false;
        self.pending_transform = None;
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    pub fn last_accessed(&self) -> Tick {
        self.last_accessed
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn context(&self) -> Option<&MedicalContext> {
        self.context.as_ref()
    }

    pub fn is_pooled(&self) -> bool {
        self.pool_class.is_some()
    }

    pub fn pool_class(&self) -> Option<Size> {
        self.pool_class
    }

    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// Allocated but unreferenced: eligible for eviction
    pub fn is_cached(&self) -> bool {
        self.allocated && self.ref_count == 0
    }

    pub fn has_pending_transform(&self) -> bool {
        self.pending_transform.is_some()
    }

    /// Current contents
    pub fn data(&self) -> &[u8] {
        &self.buffer[..self.size]
    }
}

fn scoped_context(request: &AllocationRequest) -> Option<MedicalContext> {
    match request.category {
        Category::MedicalData => request.context.clone(),
        _ => None,
    }
}

/// Per size class statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub block_size: Size,
    pub max_blocks: usize,
    pub free_blocks: usize,
    pub used_blocks: usize,
    pub committed_bytes: Size,
}

/// Allocator statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocStats {
    pub total_allocated: Size,
    pub in_use: Size,
    pub free: Size,
    pub limit: Size,
    pub by_category: BTreeMap<Category, Size>,
    pub fragmentation_ratio: f64,
    pub pool_hit_ratio: f64,
    pub gc_runs: u64,
    pub block_count: usize,
    pub pools: Vec<PoolStats>,
}

impl AllocStats {
    pub fn usage_ratio(&self) -> f64 {
        if self.limit == 0 {
            0.0
        } else {
            self.total_allocated as f64 / self.limit as f64
        }
    }

    pub fn memory_pressure(&self) -> MemoryPressure {
        MemoryPressure::from_ratio(self.usage_ratio())
    }
}

/// Memory pressure levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MemoryPressure {
    Low,
    Medium,
    High,
    Critical,
}

impl MemoryPressure {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= PRESSURE_CRITICAL_RATIO {
            MemoryPressure::Critical
        } else if ratio >= PRESSURE_HIGH_RATIO {
            MemoryPressure::High
        } else if ratio >= PRESSURE_MEDIUM_RATIO {
            MemoryPressure::Medium
        } else {
            MemoryPressure::Low
        }
    }
}

impl fmt::Display for MemoryPressure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MemoryPressure::Low => write!(f, "LOW"),
            MemoryPressure::Medium => write!(f, "MEDIUM"),
            MemoryPressure::High => write!(f, "HIGH"),
            MemoryPressure::Critical => write!(f, "CRITICAL"),
        }
    }
}
