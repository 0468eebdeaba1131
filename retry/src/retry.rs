use std::future::Future;
use std::time::Duration;

/// Runs `operation` until it succeeds, `can_retry` rejects the error, or the
/// `intervals` iterator runs out of cool-off periods. Each retry is preceded
/// by a sleep of the next interval. The error returned is always the one from
/// the most recent attempt.
///
/// `operation` is a factory invoked once per attempt; anything an attempt
/// needs must be captured (or cloned) into the future it returns.
pub async fn retry<I, O, F, T, E, C>(intervals: I, mut operation: O, can_retry: C) -> Result<T, E>
where
    I: IntoIterator<Item = Duration>,
    O: FnMut() -> F,
    F: Future<Output = Result<T, E>>,
    C: Fn(&E) -> bool,
{
    let mut intervals = intervals.into_iter();
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !can_retry(&err) {
                    return Err(err);
                }
                match intervals.next() {
                    Some(cool_off) => tokio::time::sleep(cool_off).await,
                    // ran out of backoff, return the same error
                    None => return Err(err),
                }
            }
        }
    }
}
