use tokio::sync::{mpsc, oneshot};

use crate::Result;
use crate::error::Error;
use crate::message::Block;

mod log;
pub use log::LogStore;

/// The durable block sink this receiver writes to. Retries resubmit a block
/// verbatim, so implementations must tolerate duplicate submissions of
/// identical content.
#[trait_variant::make(BlockStore: Send)]
pub trait LocalBlockStore {
    /// Durably persists one closed block.
    async fn store(&mut self, block: Block) -> Result<()>;
}

enum ActorMessage {
    Store {
        block: Block,
        respond_to: oneshot::Sender<Result<()>>,
    },
}

struct StoreActor<S> {
    actor_messages: mpsc::Receiver<ActorMessage>,
    store: S,
}

impl<S> StoreActor<S>
where
    S: BlockStore,
{
    fn new(actor_messages: mpsc::Receiver<ActorMessage>, store: S) -> Self {
        Self {
            actor_messages,
            store,
        }
    }

    async fn handle_message(&mut self, msg: ActorMessage) {
        match msg {
            ActorMessage::Store { block, respond_to } => {
                let response = self.store.store(block).await;
                let _ = respond_to.send(response);
            }
        }
    }

    async fn run(mut self) {
        while let Some(msg) = self.actor_messages.recv().await {
            self.handle_message(msg).await;
        }
    }
}

/* The actor task exits once every copy of the StoreHandle has been dropped
and the channel's buffer has drained; outstanding store attempts simply run
to completion. Receiver teardown does not wait for them. */
#[derive(Clone)]
pub(crate) struct StoreHandle {
    sender: mpsc::Sender<ActorMessage>,
}

impl StoreHandle {
    /// Spawns the store actor around the given sink implementation.
    pub(crate) fn new<S>(store: S) -> Self
    where
        S: BlockStore + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(16);
        tokio::spawn(StoreActor::new(receiver, store).run());
        Self { sender }
    }

    /// Submits one block for persistence and waits for the outcome.
    pub(crate) async fn store(&self, block: Block) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ActorMessage::Store {
                block,
                respond_to: tx,
            })
            .await
            .map_err(|e| Error::Store(format!("{e:?}")))?;
        rx.await
            .map_err(|e| Error::ActorPatternRecv(format!("{e:?}")))?
    }
}
