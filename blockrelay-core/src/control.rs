use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::error::Error;

/// Error-reporting and fail-stop surface handed to every component. Non-fatal
/// anomalies flow through [`ControlHandle::report_error`] verbatim;
/// [`ControlHandle::shutdown`] records the first cause and cancels the
/// receiver's token. Cheap to clone.
#[derive(Clone)]
pub(crate) struct ControlHandle {
    errors: mpsc::Sender<Error>,
    shutdown: CancellationToken,
    stop_cause: Arc<Mutex<Option<Error>>>,
}

impl ControlHandle {
    pub(crate) fn new() -> (Self, mpsc::Receiver<Error>) {
        let (errors, error_events) = mpsc::channel(100);
        let handle = Self {
            errors,
            shutdown: CancellationToken::new(),
            stop_cause: Arc::new(Mutex::new(None)),
        };
        (handle, error_events)
    }

    /// Forwards a non-fatal error to the receiver's error channel. The
    /// channel is best-effort; a full or closed channel drops the event, it
    /// never blocks or fails the caller.
    pub(crate) fn report_error(&self, err: Error) {
        error!(%err, "receiver error reported");
        let _ = self.errors.try_send(err);
    }

    /// Requests receiver shutdown with `cause`. The first recorded cause
    /// wins; later calls only re-cancel the already-cancelled token.
    pub(crate) fn shutdown(&self, cause: Error) {
        error!(%cause, "stopping receiver");
        {
            let mut stop_cause = self.stop_cause.lock();
            if stop_cause.is_none() {
                *stop_cause = Some(cause);
            }
        }
        self.shutdown.cancel();
    }

    /// Cancels the token without recording a cause. Used for an orderly,
    /// caller-requested stop.
    pub(crate) fn cancel(&self) {
        self.shutdown.cancel();
    }

    pub(crate) fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub(crate) fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub(crate) fn stop_cause(&self) -> Option<Error> {
        self.stop_cause.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_shutdown_cause_wins() {
        let (control, _error_events) = ControlHandle::new();
        control.shutdown(Error::Store("first".into()));
        control.shutdown(Error::Store("second".into()));

        assert!(control.is_shutting_down());
        let cause = control.stop_cause().unwrap();
        assert!(matches!(cause, Error::Store(msg) if msg == "first"));
    }

    #[tokio::test]
    async fn reported_errors_are_forwarded_verbatim() {
        let (control, mut error_events) = ControlHandle::new();
        control.report_error(Error::Protocol("mismatch".into()));

        let err = error_events.recv().await.unwrap();
        assert!(matches!(err, Error::Protocol(msg) if msg == "mismatch"));
        assert!(!control.is_shutting_down());
    }
}
