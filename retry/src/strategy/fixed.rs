use std::time::Duration;

/// A fixed-interval strategy that cools off for the same duration before
/// every retry. The iterator is infinite; use `take(n)` to allow at most
/// `n` retries.
///
/// # Example
/// ```
/// use retry::strategy::fixed::Interval;
///
/// // at most 3 retries, 100ms apart
/// let backoff = Interval::from_millis(100).take(3);
/// ```
#[derive(Debug, Clone)]
pub struct Interval {
    interval: Duration,
}

impl Interval {
    /// Creates a fixed-interval strategy with the given period in
    /// milliseconds.
    pub fn from_millis(millis: u64) -> Self {
        Self {
            interval: Duration::from_millis(millis),
        }
    }
}

impl Iterator for Interval {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.interval)
    }
}
