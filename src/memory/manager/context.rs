/*!
 * Study-Scoped Release
 * Administrative bulk release of medical-data blocks by study
 */

use super::super::types::{BlockId, Category};
use super::BlockManager;
use crate::core::types::Size;
use log::{info, warn};

impl BlockManager {
    /// Force-release every allocated medical-data block tagged with `study_id`
    ///
    /// **This bypasses reference counting.** Holders of these blocks are left
    /// with dead handles: `get` returns `None` and `release` returns `false`.
    /// It is the only operation that frees a referenced block, intended for
    /// discarding a whole study. In-flight transforms on these blocks complete
    /// as `TransformError::Superseded` without touching anything.
    ///
    /// Returns bytes reclaimed.
    pub fn release_by_context(&mut self, study_id: &str) -> Size {
        let targets: Vec<(BlockId, u32)> = self
            .registry
            .iter()
            .filter(|block| block.allocated && block.category == Category::MedicalData)
            .filter(|block| {
                block
                    .context
                    .as_ref()
                    .is_some_and(|ctx| ctx.study_id == study_id)
            })
            .map(|block| (block.id, block.ref_count))
            .collect();

        let mut freed = 0;
        for (id, holders) in &targets {
            if *holders > 0 {
                warn!(
                    "Force-releasing {} of study {} with {} active holder(s)",
                    id, study_id, holders
                );
            }
            freed += self.reclaim(*id);
        }

        if !targets.is_empty() {
            info!(
                "Released study {}: {} blocks, {} bytes reclaimed",
                study_id,
                targets.len(),
                freed
            );
        }

        freed
    }
}
