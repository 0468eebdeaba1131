use crate::committer::Committer;
use crate::control::ControlHandle;
use crate::error::Error;
use crate::message::{Block, BlockId, Event};
use crate::offsets::OffsetTableHandle;

/// BlockListener is handed to the buffering engine at start and invoked from
/// the engine's own workers at the four points of a block's life. Cheap to
/// clone and safe to call from any worker. Calls for a single block must be
/// ordered by the engine (close happens-before the next block's first add);
/// calls across different blocks may overlap freely.
#[derive(Clone)]
pub struct BlockListener {
    table: OffsetTableHandle,
    committer: Committer,
    control: ControlHandle,
}

impl BlockListener {
    pub(crate) fn new(
        table: OffsetTableHandle,
        committer: Committer,
        control: ControlHandle,
    ) -> Self {
        Self {
            table,
            committer,
            control,
        }
    }

    /// Records `event`'s offset as the latest seen in the currently open
    /// block.
    pub async fn on_element_added(&self, event: &Event) {
        if let Err(err) = self.table.observe_offset(event.offset.clone()).await {
            self.control.report_error(err);
        }
    }

    /// Freezes the open block's latest offset under `id`. This is the moment
    /// the block's committable offset is decided; later element-adds belong
    /// to the next block.
    pub async fn on_block_closed(&self, id: BlockId) {
        if let Err(err) = self.table.freeze_block(id).await {
            self.control.report_error(err);
        }
    }

    /// Persists and commits `block`. Blocks the calling engine worker for the
    /// duration of the store attempts, including retries.
    pub async fn on_block_ready(&self, block: Block) {
        self.committer.persist_and_commit(block).await;
    }

    /// Forwards an engine-reported error verbatim; no interpretation, no
    /// retry.
    pub fn on_error(&self, err: Error) {
        self.control.report_error(err);
    }
}
