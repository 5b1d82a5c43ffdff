/*!
 * Shared Block Manager
 * Cloneable handle that lets operations interleave with in-flight transforms
 */

use super::config::{AllocatorConfig, ConfigError};
use super::manager::BlockManager;
use super::transform::{TransformError, TransformOp, TransformOutcome, Transformer};
use super::types::BlockId;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// Shared handle to one `BlockManager`
///
/// Every operation runs under the lock as one indivisible step. The lock is
/// never held across an await.
#[derive(Clone)]
pub struct SharedBlockManager {
    inner: Arc<Mutex<BlockManager>>,
}

impl SharedBlockManager {
    pub fn new(manager: BlockManager) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    pub fn from_config(config: AllocatorConfig) -> Result<Self, ConfigError> {
        BlockManager::new(config).map(Self::new)
    }

    /// Lock the manager for a sequence of synchronous operations
    pub fn lock(&self) -> MutexGuard<'_, BlockManager> {
        self.inner.lock()
    }

    /// Run `f` against the manager under the lock
    pub fn with<R>(&self, f: impl FnOnce(&mut BlockManager) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Dispatch a transform and apply its result when it arrives
    ///
    /// Other operations may run while the collaborator works; they see the
    /// pre-transform block. If the block is released in the meantime the
    /// completion is discarded with `TransformError::Superseded`.
    pub async fn apply_transform(
        &self,
        id: BlockId,
        op: TransformOp,
        transformer: &dyn Transformer,
    ) -> Result<TransformOutcome, TransformError> {
        let ticket = self.inner.lock().begin_transform(id, op)?;
        let result = ticket.dispatch(transformer).await;
        self.inner.lock().complete_transform(&ticket, result)
    }
}
