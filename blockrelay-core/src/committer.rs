//! Persist-then-commit ordering lives here. For every closed block the
//! committer first makes the block durable, then publishes the block's frozen
//! offset to the checkpoint slot. A crash between the two steps loses at most
//! the in-flight block; the checkpoint can never run ahead of persisted data.
//! The offset snapshot is frozen at close time and is not touched between
//! store attempts, so retries never change which offset gets committed.

use retry::strategy::fixed;
use tracing::{info, warn};

use crate::checkpoint::CommitSlot;
use crate::config::RetryConfig;
use crate::control::ControlHandle;
use crate::error::Error;
use crate::message::{Block, BlockId};
use crate::offsets::OffsetTableHandle;
use crate::store::StoreHandle;

/// Committer drives the persist-and-commit procedure for each block the
/// buffering engine hands over. Cheap to clone; all shared state lives behind
/// the handles it carries, so persists for different blocks proceed without a
/// common lock.
#[derive(Clone)]
pub(crate) struct Committer {
    store: StoreHandle,
    table: OffsetTableHandle,
    checkpoint: CommitSlot,
    control: ControlHandle,
    retry_config: RetryConfig,
}

impl Committer {
    pub(crate) fn new(
        store: StoreHandle,
        table: OffsetTableHandle,
        checkpoint: CommitSlot,
        control: ControlHandle,
        retry_config: RetryConfig,
    ) -> Self {
        Self {
            store,
            table,
            checkpoint,
            control,
            retry_config,
        }
    }

    /// Persists `block` with bounded retries and, on success, commits its
    /// frozen offset. Exhausted retries are fatal: receiver shutdown is
    /// triggered with the last store error as the cause and the block's table
    /// entry is left in place, since no committable offset past it can ever
    /// be produced.
    pub(crate) async fn persist_and_commit(&self, block: Block) {
        let id = block.id.clone();
        let interval =
            fixed::Interval::from_millis(u64::from(self.retry_config.retry_interval_in_ms))
                .take(usize::from(self.retry_config.max_retry_attempts));

        let store = self.store.clone();
        let attempt = move || {
            let store = store.clone();
            let block = block.clone();
            async move { store.store(block).await }
        };

        let control = self.control.clone();
        let retry_id = id.clone();
        let result = retry::retry(interval, attempt, move |err: &Error| {
            if control.is_shutting_down() {
                warn!(block_id = %retry_id, "shutdown in progress, abandoning store retries");
                return false;
            }
            warn!(%err, block_id = %retry_id, "block store attempt failed");
            true
        })
        .await;

        match result {
            Ok(()) => self.commit(id).await,
            Err(err) => {
                if self.control.is_shutting_down() {
                    warn!(%err, block_id = %id, "store attempt failed during shutdown");
                    return;
                }
                self.control.shutdown(Error::Store(format!(
                    "persisting block {id} failed after {} attempts - {err}",
                    self.retry_config.max_retry_attempts + 1
                )));
            }
        }
    }

    /// Removes the block's offset snapshot and publishes it to the checkpoint
    /// slot. A missing snapshot means the buffering engine broke its
    /// close-before-persist contract; the commit is skipped and the anomaly
    /// surfaced, the pipeline keeps running.
    async fn commit(&self, id: BlockId) {
        match self.table.take_snapshot(id.clone()).await {
            Ok(Some(offset)) => {
                self.checkpoint.publish(offset.clone());
                info!(block_id = %id, %offset, "block committed");
            }
            Ok(None) => {
                self.control.report_error(Error::Protocol(format!(
                    "no offset snapshot for persisted block {id}"
                )));
            }
            Err(err) => {
                self.control.report_error(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::mpsc;
    use tokio::time::{Duration, timeout};

    use super::*;
    use crate::message::{Event, Offset};
    use crate::store::BlockStore;

    /// A store that fails a fixed number of times before succeeding.
    struct FlakyStore {
        failures: usize,
        calls: Arc<AtomicUsize>,
    }

    impl BlockStore for FlakyStore {
        async fn store(&mut self, _block: Block) -> crate::Result<()> {
            let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures {
                Err(Error::Store("injected store failure".into()))
            } else {
                Ok(())
            }
        }
    }

    fn test_config() -> RetryConfig {
        RetryConfig {
            max_retry_attempts: 3,
            retry_interval_in_ms: 1,
        }
    }

    #[allow(clippy::type_complexity)]
    fn setup(
        failures: usize,
    ) -> (
        Committer,
        OffsetTableHandle,
        CommitSlot,
        ControlHandle,
        mpsc::Receiver<Error>,
        Arc<AtomicUsize>,
    ) {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = StoreHandle::new(FlakyStore {
            failures,
            calls: Arc::clone(&calls),
        });
        let table = OffsetTableHandle::new();
        let checkpoint = CommitSlot::new();
        let (control, error_events) = ControlHandle::new();
        let committer = Committer::new(
            store,
            table.clone(),
            checkpoint.clone(),
            control.clone(),
            test_config(),
        );
        (committer, table, checkpoint, control, error_events, calls)
    }

    fn block(id: BlockId) -> Block {
        Block::new(id, vec![Event::new("payload", Offset::from("0"))])
    }

    #[tokio::test]
    async fn commit_on_first_attempt() {
        let (committer, table, checkpoint, control, _error_events, calls) = setup(0);

        for offset in ["10", "11", "12"] {
            table.observe_offset(Offset::from(offset)).await.unwrap();
        }
        let id = BlockId::from("B1");
        table.freeze_block(id.clone()).await.unwrap();

        committer.persist_and_commit(block(id)).await;

        assert_eq!(checkpoint.take(), Some(Offset::from("12")));
        assert!(table.is_empty().await.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!control.is_shutting_down());
    }

    #[tokio::test]
    async fn commit_after_transient_failures() {
        let (committer, table, checkpoint, control, _error_events, calls) = setup(2);

        table.observe_offset(Offset::from("30")).await.unwrap();
        let id = BlockId::from("B2");
        table.freeze_block(id.clone()).await.unwrap();

        committer.persist_and_commit(block(id)).await;

        assert_eq!(checkpoint.take(), Some(Offset::from("30")));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(!control.is_shutting_down());
    }

    #[tokio::test]
    async fn three_failures_is_still_within_budget() {
        let (committer, table, checkpoint, control, _error_events, calls) = setup(3);

        table.observe_offset(Offset::from("99")).await.unwrap();
        let id = BlockId::from("B4");
        table.freeze_block(id.clone()).await.unwrap();

        committer.persist_and_commit(block(id)).await;

        assert_eq!(checkpoint.take(), Some(Offset::from("99")));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(!control.is_shutting_down());
    }

    #[tokio::test]
    async fn exhausted_retries_trigger_shutdown() {
        let (committer, table, checkpoint, control, _error_events, calls) = setup(usize::MAX);

        // a prior block's commit, which must survive untouched
        checkpoint.publish(Offset::from("7"));

        table.observe_offset(Offset::from("42")).await.unwrap();
        let id = BlockId::from("B3");
        table.freeze_block(id.clone()).await.unwrap();

        committer.persist_and_commit(block(id)).await;

        assert!(control.is_shutting_down());
        let cause = control.stop_cause().unwrap();
        assert!(matches!(cause, Error::Store(msg) if msg.contains("injected store failure")));
        assert_eq!(checkpoint.peek(), Some(Offset::from("7")));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // the snapshot stays behind, nothing past it can ever be committed
        assert!(!table.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn unknown_block_reports_anomaly() {
        let (committer, table, checkpoint, control, mut error_events, calls) = setup(0);

        committer.persist_and_commit(block(BlockId::from("B9"))).await;

        assert_eq!(checkpoint.peek(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!control.is_shutting_down());
        assert!(table.is_empty().await.unwrap());

        let err = timeout(Duration::from_secs(1), error_events.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn snapshot_is_stable_under_retry() {
        let (committer, table, checkpoint, _control, _error_events, _calls) = setup(2);

        table.observe_offset(Offset::from("12")).await.unwrap();
        let id = BlockId::from("B1");
        table.freeze_block(id.clone()).await.unwrap();

        // the next block's elements keep arriving while B1 is retrying
        table.observe_offset(Offset::from("13")).await.unwrap();

        committer.persist_and_commit(block(id)).await;

        assert_eq!(checkpoint.take(), Some(Offset::from("12")));
    }
}
