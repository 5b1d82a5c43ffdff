/*!
 * Transform Collaborator
 *
 * Size-changing operations (compression, decompression) run outside the
 * allocator. A transform is two messages: `begin_transform` tags the block
 * and snapshots its bytes, `complete_transform` applies the result only if
 * the tag is still present. Releasing or recycling a block clears the tag,
 * so a late completion is a no-op instead of a write into a dead block.
 */

use super::types::{AllocError, BlockId};
use crate::core::types::{Size, TransformSeq};
use bytes::Bytes;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transform errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("Unknown or unallocated block: {0}")]
    UnknownBlock(BlockId),

    #[error("Block {0} already has a transform in flight")]
    InFlight(BlockId),

    #[error("Block {0} was released or recycled while the transform ran")]
    Superseded(BlockId),

    #[error("Transform result rejected: {0}")]
    Rejected(AllocError),

    #[error("Transform failed: {0}")]
    Failed(String),

    #[error("Transform collaborator unavailable")]
    Unavailable,
}

/// Operation requested from the collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransformOp {
    Compress { level: u8 },
    Decompress,
}

/// External byte transform
///
/// The allocator treats the output opaquely: its length becomes the block's
/// new size.
#[cfg_attr(test, mockall::automock)]
pub trait Transformer: Send + Sync {
    fn transform(
        &self,
        op: TransformOp,
        input: Bytes,
    ) -> BoxFuture<'static, Result<Vec<u8>, TransformError>>;
}

/// Pairs a dispatched transform with its completion
#[derive(Debug, Clone)]
pub struct TransformTicket {
    pub(crate) block: BlockId,
    pub(crate) seq: TransformSeq,
    pub(crate) op: TransformOp,
    pub(crate) input: Bytes,
}

impl TransformTicket {
    pub fn block(&self) -> BlockId {
        self.block
    }

    pub fn op(&self) -> TransformOp {
        self.op
    }

    /// Snapshot of the block's bytes at dispatch time
    pub fn input(&self) -> &Bytes {
        &self.input
    }

    /// Run the collaborator on this ticket's snapshot
    pub fn dispatch(
        &self,
        transformer: &dyn Transformer,
    ) -> BoxFuture<'static, Result<Vec<u8>, TransformError>> {
        transformer.transform(self.op, self.input.clone())
    }
}

/// Applied transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformOutcome {
    pub block: BlockId,
    pub op: TransformOp,
    pub old_size: Size,
    pub new_size: Size,
}

impl TransformOutcome {
    /// Bytes reclaimed (negative when the block grew)
    pub fn delta(&self) -> i64 {
        self.old_size as i64 - self.new_size as i64
    }
}
