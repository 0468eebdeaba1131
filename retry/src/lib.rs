//! Bounded retry for fallible async operations. The retry budget is expressed
//! as an iterator of cool-off [`Duration`](std::time::Duration)s (see
//! [`strategy`]); when the iterator is exhausted the last error is returned
//! to the caller unchanged. The first run of the operation is not a retry, so
//! an interval iterator of length N allows N + 1 attempts in total.

pub mod strategy;

mod retry;
pub use crate::retry::retry;
