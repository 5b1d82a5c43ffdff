/*!
 * Capacity Governor
 * Global and per-category byte accounting against configured ceilings
 */

use super::config::AllocatorConfig;
use super::types::{AllocError, AllocResult, Category};
use crate::core::types::Size;

const CATEGORY_COUNT: usize = Category::ALL.len();

/// Running byte totals checked against the configured ceilings
#[derive(Debug, Clone)]
pub(crate) struct CapacityGovernor {
    global_limit: Size,
    category_limits: [Option<Size>; CATEGORY_COUNT],
    total: Size,
    by_category: [Size; CATEGORY_COUNT],
}

impl CapacityGovernor {
    pub fn new(config: &AllocatorConfig) -> Self {
        let mut category_limits = [None; CATEGORY_COUNT];
        for category in Category::ALL {
            category_limits[category.index()] = config.category_limit(category);
        }

        Self {
            global_limit: config.global_limit,
            category_limits,
            total: 0,
            by_category: [0; CATEGORY_COUNT],
        }
    }

    /// Both the global and the category ceiling must admit `size` more bytes.
    /// Nothing is mutated.
    pub fn check(&self, size: Size, category: Category) -> AllocResult<()> {
        if self.total.saturating_add(size) > self.global_limit {
            return Err(AllocError::GlobalLimitExceeded {
                requested: size,
                used: self.total,
                limit: self.global_limit,
            });
        }

        if let Some(limit) = self.category_limits[category.index()] {
            let used = self.by_category[category.index()];
            if used.saturating_add(size) > limit {
                return Err(AllocError::CategoryLimitExceeded {
                    category,
                    requested: size,
                    used,
                    limit,
                });
            }
        }

        Ok(())
    }

    pub fn can_allocate(&self, size: Size, category: Category) -> bool {
        self.check(size, category).is_ok()
    }

    pub fn record_allocation(&mut self, size: Size, category: Category) {
        self.total += size;
        self.by_category[category.index()] += size;
    }

    pub fn record_release(&mut self, size: Size, category: Category) {
        self.total = self.total.saturating_sub(size);
        let used = &mut self.by_category[category.index()];
        *used = used.saturating_sub(size);
    }

    /// Replace `old` bytes with `new` bytes for a resized block
    pub fn record_resize(&mut self, old: Size, new: Size, category: Category) {
        self.record_release(old, category);
        self.record_allocation(new, category);
    }

    pub fn total(&self) -> Size {
        self.total
    }

    pub fn global_limit(&self) -> Size {
        self.global_limit
    }

    pub fn available(&self) -> Size {
        self.global_limit.saturating_sub(self.total)
    }

    pub fn category_usage(&self, category: Category) -> Size {
        self.by_category[category.index()]
    }

    pub fn reset(&mut self) {
        self.total = 0;
        self.by_category = [0; CATEGORY_COUNT];
    }
}
