//! Debounced trigger

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Coalesces bursts of calls into one delayed invocation
///
/// Each `schedule` cancels the previously scheduled invocation if it has not
/// fired yet. Once the quiet period elapses the invocation runs to
/// completion; cancelling its network work is the request slot's job.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<CancellationToken>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Schedule `f` after the quiet period
    ///
    /// The handle yields `None` when a later call replaced this one.
    pub fn schedule<F, Fut, T>(&self, f: F) -> JoinHandle<Option<T>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let token = CancellationToken::new();
        if let Some(previous) = self.replace(Some(token.clone())) {
            previous.cancel();
        }

        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => None,
                _ = tokio::time::sleep(delay) => Some(f().await),
            }
        })
    }

    /// Drop the scheduled invocation, if one is waiting
    pub fn cancel(&self) {
        if let Some(previous) = self.replace(None) {
            previous.cancel();
        }
    }

    fn replace(&self, token: Option<CancellationToken>) -> Option<CancellationToken> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *pending, token)
    }
}
