//! Events arrive one at a time from the upstream feed, each tagged with an
//! offset. The buffering engine assembles them into a [Block] and hands the
//! block over exactly once for persistence. Offsets and block ids are opaque
//! to this crate; they are compared for equality and used as map keys, never
//! interpreted.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Position marker the upstream feed attaches to every event. Ordering is
/// owed by the feed; this crate only carries it through to the checkpoint.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct Offset(Bytes);

impl Offset {
    pub fn new(offset: impl Into<Bytes>) -> Self {
        Self(offset.into())
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }
}

impl From<&str> for Offset {
    fn from(offset: &str) -> Self {
        Self(Bytes::copy_from_slice(offset.as_bytes()))
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Identifier the buffering engine assigns to a closed block, unique per
/// block. Used only as a map key.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct BlockId(Bytes);

impl BlockId {
    pub fn new(id: impl Into<Bytes>) -> Self {
        Self(id.into())
    }
}

impl From<&str> for BlockId {
    fn from(id: &str) -> Self {
        Self(Bytes::copy_from_slice(id.as_bytes()))
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// A single event read from the upstream feed.
/// NOTE: It is cheap to clone.
#[derive(Debug, Clone)]
pub struct Event {
    /// actual payload of the event
    pub value: Bytes,
    /// offset of the event within the upstream feed
    pub offset: Offset,
    /// event time of the event
    pub event_time: DateTime<Utc>,
}

impl Event {
    pub fn new(value: impl Into<Bytes>, offset: Offset) -> Self {
        Self {
            value: value.into(),
            offset,
            event_time: Utc::now(),
        }
    }
}

/// A batch of events cut by the buffering engine for a single durability
/// write. Handed to the persistence attempt by value; `Clone` exists only so
/// retries can resubmit identical content.
#[derive(Debug, Clone)]
pub struct Block {
    pub id: BlockId,
    pub events: Vec<Event>,
}

impl Block {
    pub fn new(id: BlockId, events: Vec<Event>) -> Self {
        Self { id, events }
    }
}
