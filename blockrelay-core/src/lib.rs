//! Reliability layer of a streaming ingestion receiver. Events arrive from an
//! upstream feed tagged with monotonically increasing offsets; an external
//! buffering engine groups them into blocks and drives the
//! [BlockListener] callbacks. This crate guarantees persist-then-commit
//! ordering: a block's offset reaches the checkpoint writer only after the
//! block itself is durable, so a crash loses at most one in-flight block and
//! never advances the checkpoint past unpersisted data.
//!
//! Sustained storage failure is fail-stop by policy: after the bounded retry
//! budget is spent, the receiver shuts down with the last store error as the
//! cause instead of running in a degraded state.

pub use crate::error::{Error, Result};

mod checkpoint;
mod committer;
mod config;
mod control;
mod engine;
mod error;
mod listener;
mod message;
mod offsets;
mod receiver;
mod store;

pub use crate::checkpoint::CommitSlot;
pub use crate::config::RetryConfig;
pub use crate::engine::{BlockEngine, LocalBlockEngine};
pub use crate::listener::BlockListener;
pub use crate::message::{Block, BlockId, Event, Offset};
pub use crate::receiver::Receiver;
pub use crate::store::{BlockStore, LocalBlockStore, LogStore};
