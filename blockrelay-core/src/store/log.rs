use tracing::info;

use crate::Result;
use crate::message::Block;
use crate::store::BlockStore;

/// A sink that logs each block instead of persisting it. Useful for wiring
/// tests and local runs.
pub struct LogStore;

impl BlockStore for LogStore {
    async fn store(&mut self, block: Block) -> Result<()> {
        info!(block_id = %block.id, events = block.events.len(), "block received");
        Ok(())
    }
}
