/*!
 * System Limits and Constants
 *
 * Centralized location for allocator-wide limits, thresholds, and defaults.
 * Organized by domain for maintainability and discoverability.
 *
 * - Performance-relevant constants are marked with [PERF]
 */

use super::types::Size;

const KIB: Size = 1024;
const MIB: Size = 1024 * 1024;

// =============================================================================
// CAPACITY LIMITS
// =============================================================================

/// Default global ceiling for all managed buffers (512MB)
pub const DEFAULT_GLOBAL_LIMIT: Size = 512 * MIB;

/// Default ceiling for rendering textures (192MB)
pub const DEFAULT_TEXTURE_LIMIT: Size = 192 * MIB;

/// Default ceiling for generic data buffers (128MB)
pub const DEFAULT_BUFFER_LIMIT: Size = 128 * MIB;

/// Default ceiling for imaging volumes and pixel data (256MB)
pub const DEFAULT_MEDICAL_DATA_LIMIT: Size = 256 * MIB;

// =============================================================================
// POOLING
// =============================================================================

/// Default size classes (4KB to 16MB in powers of four), ascending
/// [PERF] Requests round up to the next class
pub const DEFAULT_SIZE_CLASSES: [Size; 7] = [
    4 * KIB,
    16 * KIB,
    64 * KIB,
    256 * KIB,
    MIB,
    4 * MIB,
    16 * MIB,
];

/// Each size class may commit at most 1/10th of the global limit
pub const POOL_CLASS_SHARE_DIVISOR: Size = 10;

// =============================================================================
// GARBAGE COLLECTION
// =============================================================================

/// Eviction stops once usage falls to this fraction of the global limit
pub const DEFAULT_GC_THRESHOLD: f64 = 0.8;

// =============================================================================
// MEMORY PRESSURE
// =============================================================================

/// Usage ratio reported as medium pressure
pub const PRESSURE_MEDIUM_RATIO: f64 = 0.60;

/// Usage ratio reported as high pressure (warning)
pub const PRESSURE_HIGH_RATIO: f64 = 0.80;

/// Usage ratio reported as critical pressure
pub const PRESSURE_CRITICAL_RATIO: f64 = 0.95;
