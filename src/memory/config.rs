/*!
 * Allocator Configuration
 *
 * Ceilings, size classes, and GC/pooling/profiling switches. Validated once
 * when the manager is constructed.
 */

use super::types::Category;
use crate::core::limits::{
    DEFAULT_BUFFER_LIMIT, DEFAULT_GC_THRESHOLD, DEFAULT_GLOBAL_LIMIT, DEFAULT_MEDICAL_DATA_LIMIT,
    DEFAULT_SIZE_CLASSES, DEFAULT_TEXTURE_LIMIT,
};
use crate::core::types::Size;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Configuration errors, fatal at construction time
#[derive(Error, Debug, Clone, PartialEq, Diagnostic)]
pub enum ConfigError {
    #[error("Global limit must be greater than zero")]
    #[diagnostic(
        code(config::zero_global_limit),
        help("Set global_limit to the byte ceiling for all managed buffers.")
    )]
    ZeroGlobalLimit,

    #[error("Pooling is enabled but no size classes are configured")]
    #[diagnostic(
        code(config::empty_size_classes),
        help("Provide at least one size class or disable pooling explicitly.")
    )]
    EmptySizeClasses,

    #[error("Size classes must be non-zero")]
    #[diagnostic(code(config::zero_size_class))]
    ZeroSizeClass,

    #[error("Duplicate size class: {0} bytes")]
    #[diagnostic(
        code(config::duplicate_size_class),
        help("Each size class must be distinct.")
    )]
    DuplicateSizeClass(Size),

    #[error("GC threshold must be within 0.0..=1.0, got {0}")]
    #[diagnostic(code(config::invalid_gc_threshold))]
    InvalidGcThreshold(f64),

    #[error("Failed to load configuration: {0}")]
    #[diagnostic(code(config::load_failed))]
    Load(String),
}

/// Allocator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Byte ceiling across all categories (default: 512MB)
    pub global_limit: Size,

    /// Per-category ceilings; categories without an entry are unconstrained
    pub category_limits: BTreeMap<Category, Size>,

    /// Size classes in bytes, any order (default: 4KB..16MB)
    pub size_classes: Vec<Size>,

    /// Fraction of the global limit eviction drains to (default: 0.8)
    pub gc_threshold: f64,

    /// Serve requests from size-class pools (default: true)
    pub pooling: bool,

    /// Log every allocation and release at info level (default: false)
    pub profiling: bool,
}

impl AllocatorConfig {
    /// Create default configuration
    pub fn new() -> Self {
        let mut category_limits = BTreeMap::new();
        category_limits.insert(Category::Texture, DEFAULT_TEXTURE_LIMIT);
        category_limits.insert(Category::Buffer, DEFAULT_BUFFER_LIMIT);
        category_limits.insert(Category::MedicalData, DEFAULT_MEDICAL_DATA_LIMIT);

        Self {
            global_limit: DEFAULT_GLOBAL_LIMIT,
            category_limits,
            size_classes: DEFAULT_SIZE_CLASSES.to_vec(),
            gc_threshold: DEFAULT_GC_THRESHOLD,
            pooling: true,
            profiling: false,
        }
    }

    /// Configuration with a global limit only: no category caps
    pub fn unconstrained(global_limit: Size) -> Self {
        Self {
            global_limit,
            category_limits: BTreeMap::new(),
            ..Self::new()
        }
    }

    pub fn with_global_limit(mut self, limit: Size) -> Self {
        self.global_limit = limit;
        self
    }

    pub fn with_category_limit(mut self, category: Category, limit: Size) -> Self {
        self.category_limits.insert(category, limit);
        self
    }

    pub fn without_category_limit(mut self, category: Category) -> Self {
        self.category_limits.remove(&category);
        self
    }

    pub fn with_size_classes(mut self, classes: impl Into<Vec<Size>>) -> Self {
        self.size_classes = classes.into();
        self
    }

    pub fn with_gc_threshold(mut self, threshold: f64) -> Self {
        self.gc_threshold = threshold;
        self
    }

    pub fn with_pooling(mut self, enabled: bool) -> Self {
        self.pooling = enabled;
        self
    }

    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.profiling = enabled;
        self
    }

    /// Parse configuration from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.global_limit == 0 {
            return Err(ConfigError::ZeroGlobalLimit);
        }

        if !(0.0..=1.0).contains(&self.gc_threshold) {
            return Err(ConfigError::InvalidGcThreshold(self.gc_threshold));
        }

        if self.pooling && self.size_classes.is_empty() {
            return Err(ConfigError::EmptySizeClasses);
        }

        if self.size_classes.contains(&0) {
            return Err(ConfigError::ZeroSizeClass);
        }

        let mut sorted = self.size_classes.clone();
        sorted.sort_unstable();
        if let Some(pair) = sorted.windows(2).find(|w| w[0] == w[1]) {
            return Err(ConfigError::DuplicateSizeClass(pair[0]));
        }

        Ok(())
    }

    /// Ceiling for a category, if one is configured
    pub fn category_limit(&self, category: Category) -> Option<Size> {
        self.category_limits.get(&category).copied()
    }

    /// Usage level eviction drains down to
    pub fn gc_target(&self) -> Size {
        (self.global_limit as f64 * self.gc_threshold) as Size
    }
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self::new()
    }
}
