/*!
 * Block Storage Operations
 * Bounds-checked reads and writes of block contents
 */

use super::super::types::{AllocError, AllocResult, BlockId};
use super::BlockManager;
use crate::core::types::Size;

impl BlockManager {
    /// Write bytes at `offset` within an allocated block
    ///
    /// Refused while a transform is in flight, since its completion would
    /// replace the buffer.
    pub fn write(&mut self, id: BlockId, offset: Size, data: &[u8]) -> AllocResult<()> {
        let tick = self.clock + 1;
        let block = self
            .registry
            .get_mut(id)
            .filter(|block| block.allocated)
            .ok_or(AllocError::InvalidBlock(id))?;

        if block.pending_transform.is_some() {
            return Err(AllocError::TransformPending(id));
        }

        let end = offset
            .checked_add(data.len())
            .filter(|&end| end <= block.size)
            .ok_or(AllocError::OutOfBounds {
                id,
                offset,
                len: data.len(),
                size: block.size,
            })?;

        block.buffer[offset..end].copy_from_slice(data);
        block.last_accessed = tick;
        self.clock = tick;
        Ok(())
    }

    /// Copy `len` bytes starting at `offset` out of an allocated block
    pub fn read(&mut self, id: BlockId, offset: Size, len: Size) -> AllocResult<Vec<u8>> {
        let block = self.get(id).ok_or(AllocError::InvalidBlock(id))?;

        let end = offset
            .checked_add(len)
            .filter(|&end| end <= block.size())
            .ok_or(AllocError::OutOfBounds {
                id,
                offset,
                len,
                size: block.size(),
            })?;

        Ok(block.data()[offset..end].to_vec())
    }
}
