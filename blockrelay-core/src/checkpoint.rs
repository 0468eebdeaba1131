use std::sync::Arc;

use parking_lot::Mutex;

use crate::message::Offset;

/// Single-slot hand-off between the committer and the external checkpoint
/// writer. Every successful block commit overwrites the slot; the writer
/// drains it on its own cadence via [`CommitSlot::take`]. Neither side ever
/// waits on the other, the only guarantee is that the most recent successful
/// commit wins.
#[derive(Clone, Default)]
pub struct CommitSlot {
    slot: Arc<Mutex<Option<Offset>>>,
}

impl CommitSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the slot with the offset of the most recently committed
    /// block.
    pub(crate) fn publish(&self, offset: Offset) {
        *self.slot.lock() = Some(offset);
    }

    /// Reads and clears the slot.
    pub fn take(&self) -> Option<Offset> {
        self.slot.lock().take()
    }

    /// Reads the slot without consuming it.
    pub fn peek(&self) -> Option<Offset> {
        self.slot.lock().clone()
    }

    /// Teardown-only invalidation.
    pub(crate) fn clear(&self) {
        *self.slot.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_recent_publish_wins() {
        let slot = CommitSlot::new();
        slot.publish(Offset::from("10"));
        slot.publish(Offset::from("20"));
        assert_eq!(slot.peek(), Some(Offset::from("20")));
    }

    #[test]
    fn take_clears_the_slot() {
        let slot = CommitSlot::new();
        slot.publish(Offset::from("10"));
        assert_eq!(slot.take(), Some(Offset::from("10")));
        assert_eq!(slot.take(), None);
    }
}
