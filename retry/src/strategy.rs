//! Backoff strategies are plain `Iterator<Item = Duration>`s; a strategy
//! decides how long to cool off before each retry, while [`crate::retry`]
//! decides whether to keep going. Bound an infinite strategy with
//! `Iterator::take` to cap the number of retries.

pub mod fixed;
