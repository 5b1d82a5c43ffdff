/*!
 * Transform Integration
 * Tagged dispatch and atomic completion of size-changing transforms
 */

use super::super::transform::{
    TransformError, TransformOp, TransformOutcome, TransformTicket, Transformer,
};
use super::super::types::BlockId;
use super::BlockManager;
use bytes::Bytes;
use log::{debug, warn};

impl BlockManager {
    /// Tag a block with a new transform and snapshot its bytes
    ///
    /// The block stays fully usable (reads see the pre-transform bytes) until
    /// the ticket is completed. Writes are refused meanwhile.
    pub fn begin_transform(
        &mut self,
        id: BlockId,
        op: TransformOp,
    ) -> Result<TransformTicket, TransformError> {
        self.transform_seq += 1;
        let seq = self.transform_seq;

        let block = self
            .registry
            .get_mut(id)
            .filter(|block| block.allocated)
            .ok_or(TransformError::UnknownBlock(id))?;

        if block.pending_transform.is_some() {
            return Err(TransformError::InFlight(id));
        }

        block.pending_transform = Some(seq);
        let input = Bytes::copy_from_slice(block.data());

        debug!("Dispatched {:?} #{} for {} ({} bytes)", op, seq, id, input.len());

        Ok(TransformTicket {
            block: id,
            seq,
            op,
            input,
        })
    }

    /// Apply the collaborator's result for `ticket`
    ///
    /// Buffer, size, and accounting change together or not at all. If the
    /// block was released or recycled since dispatch, nothing happens and
    /// `Superseded` is returned. A failed transform or an output the
    /// ceilings cannot admit leaves the block unchanged.
    pub fn complete_transform(
        &mut self,
        ticket: &TransformTicket,
        result: Result<Vec<u8>, TransformError>,
    ) -> Result<TransformOutcome, TransformError> {
        let id = ticket.block;
        let block = match self.registry.get_mut(id) {
            Some(block) if block.allocated && block.pending_transform == Some(ticket.seq) => block,
            _ => {
                debug!("Discarding stale completion #{} for {}", ticket.seq, id);
                return Err(TransformError::Superseded(id));
            }
        };
        block.pending_transform = None;

        let output = match result {
            Ok(output) if output.is_empty() => {
                return Err(TransformError::Failed("empty output".into()));
            }
            Ok(output) => output,
            Err(e) => {
                warn!("{:?} on {} failed: {}", ticket.op, id, e);
                return Err(e);
            }
        };

        let old_size = block.size;
        let new_size = output.len();
        let category = block.category;

        if new_size > old_size {
            if let Err(e) = self.governor.check(new_size - old_size, category) {
                warn!("{:?} on {} rejected: {}", ticket.op, id, e);
                return Err(TransformError::Rejected(e));
            }
        }

        if new_size != old_size && block.is_pooled() {
            self.pools.detach(block);
        }

        block.buffer = output;
        block.size = new_size;
        self.governor.record_resize(old_size, new_size, category);

        profile!(
            self,
            "{:?} on {} applied: {} -> {} bytes",
            ticket.op,
            id,
            old_size,
            new_size
        );

        Ok(TransformOutcome {
            block: id,
            op: ticket.op,
            old_size,
            new_size,
        })
    }

    /// Dispatch, await, and complete a transform
    ///
    /// `&mut self` is held across the await, so nothing else can touch the
    /// manager meanwhile; use `SharedBlockManager::apply_transform` to let
    /// other operations interleave.
    pub async fn apply_transform(
        &mut self,
        id: BlockId,
        op: TransformOp,
        transformer: &dyn Transformer,
    ) -> Result<TransformOutcome, TransformError> {
        let ticket = self.begin_transform(id, op)?;
        let result = ticket.dispatch(transformer).await;
        self.complete_transform(&ticket, result)
    }
}
