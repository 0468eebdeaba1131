use crate::Result;
use crate::listener::BlockListener;
use crate::message::Event;

/// The buffering-engine collaborator. It owns the block-cutting policy and
/// its own worker scheduling, and drives the [`BlockListener`] callbacks.
/// The engine owes one ordering guarantee: a block's close is delivered
/// before the next block's first element-add.
#[trait_variant::make(BlockEngine: Send)]
pub trait LocalBlockEngine {
    /// Starts the engine's workers; all subsequent callbacks go to
    /// `listener`.
    async fn start(&mut self, listener: BlockListener) -> Result<()>;

    /// Stops the engine. No callbacks may be delivered after this returns.
    async fn stop(&mut self) -> Result<()>;

    /// Feeds one event into the currently open block. Invoked by the
    /// upstream-feed side, never by this crate.
    async fn add_element(&mut self, event: Event) -> Result<()>;
}
