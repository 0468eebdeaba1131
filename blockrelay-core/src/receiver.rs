//! Receiver wires the reliability layer together and owns its lifecycle.
//!
//! ```text
//! (engine) --[callbacks]--> (listener) ----> {offset table}
//!                               |
//!                               v
//!                          (committer) --retry--> {store}
//!                               |
//!                               v
//!                       [checkpoint slot] <--poll-- external writer
//!
//! {} -> mpsc actor   [] -> shared slot   () -> component
//! ```
//!
//! Teardown order matters: the engine is stopped first so no further
//! callbacks arrive, then the offset table and checkpoint slot are cleared.
//! In-flight persist attempts are not waited for; their late table accesses
//! land on the cleared map as no-ops.

use tokio::sync::mpsc;
use tracing::info;

use crate::Result;
use crate::checkpoint::CommitSlot;
use crate::committer::Committer;
use crate::config::RetryConfig;
use crate::control::ControlHandle;
use crate::engine::BlockEngine;
use crate::error::Error;
use crate::listener::BlockListener;
use crate::offsets::OffsetTableHandle;
use crate::store::{BlockStore, StoreHandle};

enum State {
    Created,
    Running,
    Stopped,
}

/// Receiver owns the block/offset bookkeeping between `start` and `stop` and
/// surfaces fatal failures through its stop cause. A receiver that has
/// fail-stopped is not restartable; recovery is a fresh receiver resuming
/// from the last committed checkpoint.
pub struct Receiver<E, S> {
    engine: E,
    store: Option<S>,
    retry_config: RetryConfig,
    state: State,
    table: Option<OffsetTableHandle>,
    checkpoint: CommitSlot,
    control: ControlHandle,
    error_events: mpsc::Receiver<Error>,
}

impl<E, S> Receiver<E, S>
where
    E: BlockEngine,
    S: BlockStore + Send + 'static,
{
    pub fn new(engine: E, store: S, retry_config: RetryConfig) -> Self {
        let (control, error_events) = ControlHandle::new();
        Self {
            engine,
            store: Some(store),
            retry_config,
            state: State::Created,
            table: None,
            checkpoint: CommitSlot::new(),
            control,
            error_events,
        }
    }

    /// Allocates the offset table and store actor, builds the listener, and
    /// starts the buffering engine. Calling `start` on a running receiver is
    /// a no-op; a stopped receiver cannot be restarted.
    pub async fn start(&mut self) -> Result<()> {
        match self.state {
            State::Running => return Ok(()),
            State::Stopped => {
                return Err(Error::Receiver(
                    "cannot restart a stopped receiver".to_string(),
                ));
            }
            State::Created => {}
        }

        let store = self
            .store
            .take()
            .ok_or_else(|| Error::Receiver("store already consumed".to_string()))?;
        let table = OffsetTableHandle::new();
        let committer = Committer::new(
            StoreHandle::new(store),
            table.clone(),
            self.checkpoint.clone(),
            self.control.clone(),
            self.retry_config.clone(),
        );
        let listener = BlockListener::new(table.clone(), committer, self.control.clone());

        self.engine.start(listener).await?;
        self.table = Some(table);
        self.state = State::Running;
        info!("receiver started");
        Ok(())
    }

    /// Stops the engine first (no further callbacks), then clears the offset
    /// table and checkpoint slot. Idempotent: stopping twice, or before
    /// start, is a no-op. Does not wait for in-flight persist attempts.
    pub async fn stop(&mut self) -> Result<()> {
        match self.state {
            State::Running => {}
            State::Created | State::Stopped => return Ok(()),
        }

        self.engine.stop().await?;
        if let Some(table) = self.table.take() {
            table.clear().await?;
        }
        self.checkpoint.clear();
        self.control.cancel();
        self.state = State::Stopped;
        info!("receiver stopped");
        Ok(())
    }

    /// Resolves once shutdown has been requested, by fail-stop or by an
    /// orderly stop.
    pub async fn stopped(&self) {
        self.control.cancellation_token().cancelled().await;
    }

    pub fn is_shutting_down(&self) -> bool {
        self.control.is_shutting_down()
    }

    /// The fatal cause recorded by fail-stop, if any. Orderly stops leave no
    /// cause.
    pub fn stop_cause(&self) -> Option<Error> {
        self.control.stop_cause()
    }

    /// Pending-commit offset hand-off for the external checkpoint writer.
    pub fn commit_slot(&self) -> CommitSlot {
        self.checkpoint.clone()
    }

    /// Receives the next non-fatal error reported through the error channel.
    pub async fn next_error(&mut self) -> Option<Error> {
        self.error_events.recv().await
    }

    /// Waits for a shutdown trigger and then performs the stop sequence.
    pub async fn run_to_completion(&mut self) -> Result<()> {
        self.stopped().await;
        self.stop().await
    }
}
