//! The offset table is the bookkeeping heart of the commit protocol. While a
//! block is open it tracks the latest offset seen; the moment the buffering
//! engine closes the block that offset is frozen under the block's id. The
//! entry then stays put, untouched by store retries, until the block has been
//! durably persisted, at which point it is removed and handed to the
//! checkpoint slot. An id is present in the table iff its block is closed but
//! not yet committed.
//!
//! All mutation is serialized through an actor (one table per receiver), so a
//! close captures the latest offset atomically with respect to element-adds
//! and callers on different blocks never contend on a lock.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::Result;
use crate::error::Error;
use crate::message::{BlockId, Offset};

/// ActorMessage represents the messages that can be sent to the table actor.
enum ActorMessage {
    ObserveOffset {
        offset: Offset,
    },
    FreezeBlock {
        id: BlockId,
    },
    TakeSnapshot {
        id: BlockId,
        respond_to: oneshot::Sender<Option<Offset>>,
    },
    Clear,
    #[cfg(test)]
    IsEmpty {
        respond_to: oneshot::Sender<bool>,
    },
}

/// OffsetTable owns the latest-offset cell of the open block and the frozen
/// snapshots of closed blocks.
struct OffsetTable {
    latest: Option<Offset>,
    entries: HashMap<BlockId, Offset>,
    receiver: mpsc::Receiver<ActorMessage>,
}

impl OffsetTable {
    fn new(receiver: mpsc::Receiver<ActorMessage>) -> Self {
        Self {
            latest: None,
            entries: HashMap::new(),
            receiver,
        }
    }

    async fn run(mut self) {
        while let Some(message) = self.receiver.recv().await {
            self.handle_message(message);
        }
    }

    fn handle_message(&mut self, message: ActorMessage) {
        match message {
            ActorMessage::ObserveOffset { offset } => {
                self.latest = Some(offset);
            }
            ActorMessage::FreezeBlock { id } => {
                self.handle_freeze(id);
            }
            ActorMessage::TakeSnapshot { id, respond_to } => {
                let _ = respond_to.send(self.entries.remove(&id));
            }
            ActorMessage::Clear => {
                self.entries.clear();
                self.latest = None;
            }
            #[cfg(test)]
            ActorMessage::IsEmpty { respond_to } => {
                let _ = respond_to.send(self.entries.is_empty());
            }
        }
    }

    /// Captures the latest observed offset as the snapshot for `id`. The
    /// latest cell is cloned, not taken: the stream position survives a close
    /// that lands before the next block's first element.
    fn handle_freeze(&mut self, id: BlockId) {
        match self.latest.clone() {
            Some(offset) => {
                self.entries.insert(id, offset);
            }
            None => {
                warn!(block_id = %id, "block closed before any element was observed, nothing to freeze");
            }
        }
    }
}

/// OffsetTableHandle provides an interface to interact with the table from
/// any of the buffering engine's workers. Cheap to clone. Once the table has
/// been cleared at teardown, further messages land on the emptied map and are
/// safe no-ops.
#[derive(Clone)]
pub(crate) struct OffsetTableHandle {
    sender: mpsc::Sender<ActorMessage>,
}

impl OffsetTableHandle {
    /// Creates a new handle and spawns the table actor.
    pub(crate) fn new() -> Self {
        let (sender, receiver) = mpsc::channel(100);
        tokio::spawn(OffsetTable::new(receiver).run());
        Self { sender }
    }

    /// Records `offset` as the latest seen in the currently open block.
    pub(crate) async fn observe_offset(&self, offset: Offset) -> Result<()> {
        self.send(ActorMessage::ObserveOffset { offset }).await
    }

    /// Freezes the open block's latest offset under `id`. Called exactly once
    /// per block, at close.
    pub(crate) async fn freeze_block(&self, id: BlockId) -> Result<()> {
        self.send(ActorMessage::FreezeBlock { id }).await
    }

    /// Atomically removes and returns the snapshot for `id`. `None` means the
    /// id was never frozen, which signals a contract breach by the buffering
    /// engine rather than a bug here.
    pub(crate) async fn take_snapshot(&self, id: BlockId) -> Result<Option<Offset>> {
        let (respond_to, response) = oneshot::channel();
        self.send(ActorMessage::TakeSnapshot { id, respond_to })
            .await?;
        response
            .await
            .map_err(|e| Error::ActorPatternRecv(format!("{e:?}")))
    }

    /// Bulk invalidation, used only during teardown.
    pub(crate) async fn clear(&self) -> Result<()> {
        self.send(ActorMessage::Clear).await
    }

    /// Checks if the table is empty. Used by tests to verify that every
    /// committed block's entry was evicted.
    #[cfg(test)]
    pub(crate) async fn is_empty(&self) -> Result<bool> {
        let (respond_to, response) = oneshot::channel();
        self.send(ActorMessage::IsEmpty { respond_to }).await?;
        response
            .await
            .map_err(|e| Error::ActorPatternRecv(format!("{e:?}")))
    }

    async fn send(&self, message: ActorMessage) -> Result<()> {
        self.sender
            .send(message)
            .await
            .map_err(|e| Error::OffsetTable(format!("{e:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn freeze_captures_latest_offset() {
        let handle = OffsetTableHandle::new();

        for offset in ["10", "11", "12"] {
            handle.observe_offset(Offset::from(offset)).await.unwrap();
        }
        handle.freeze_block(BlockId::from("B1")).await.unwrap();

        let snapshot = handle.take_snapshot(BlockId::from("B1")).await.unwrap();
        assert_eq!(snapshot, Some(Offset::from("12")));
        assert!(handle.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn take_is_read_then_delete() {
        let handle = OffsetTableHandle::new();

        handle.observe_offset(Offset::from("5")).await.unwrap();
        handle.freeze_block(BlockId::from("B1")).await.unwrap();

        let first = handle.take_snapshot(BlockId::from("B1")).await.unwrap();
        let second = handle.take_snapshot(BlockId::from("B1")).await.unwrap();
        assert_eq!(first, Some(Offset::from("5")));
        assert_eq!(second, None);
    }

    #[tokio::test]
    async fn unknown_id_returns_none() {
        let handle = OffsetTableHandle::new();
        let snapshot = handle.take_snapshot(BlockId::from("B9")).await.unwrap();
        assert_eq!(snapshot, None);
    }

    #[tokio::test]
    async fn freeze_before_any_element_inserts_nothing() {
        let handle = OffsetTableHandle::new();
        handle.freeze_block(BlockId::from("B1")).await.unwrap();
        assert!(handle.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn snapshots_are_independent_across_blocks() {
        let handle = OffsetTableHandle::new();

        handle.observe_offset(Offset::from("12")).await.unwrap();
        handle.freeze_block(BlockId::from("B1")).await.unwrap();

        // next block's elements do not disturb the frozen snapshot
        handle.observe_offset(Offset::from("13")).await.unwrap();
        handle.observe_offset(Offset::from("14")).await.unwrap();
        handle.freeze_block(BlockId::from("B2")).await.unwrap();

        let first = handle.take_snapshot(BlockId::from("B1")).await.unwrap();
        let second = handle.take_snapshot(BlockId::from("B2")).await.unwrap();
        assert_eq!(first, Some(Offset::from("12")));
        assert_eq!(second, Some(Offset::from("14")));
    }

    #[tokio::test]
    async fn clear_empties_the_table() {
        let handle = OffsetTableHandle::new();

        handle.observe_offset(Offset::from("1")).await.unwrap();
        handle.freeze_block(BlockId::from("B1")).await.unwrap();
        handle.clear().await.unwrap();

        assert!(handle.is_empty().await.unwrap());
        // post-clear messages are safe no-ops
        let snapshot = handle.take_snapshot(BlockId::from("B1")).await.unwrap();
        assert_eq!(snapshot, None);
    }
}
