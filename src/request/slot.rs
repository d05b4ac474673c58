//! Cancellable request slots
//!
//! At most one request per [`OperationKind`] is live. Starting a new one
//! cancels its predecessor, whose eventual result is discarded.

use crate::catalog::Category;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Logical operation a request belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Suggest,
    Search,
    /// Recommendations fetched for the first search result
    SearchRecs,
    ItemRecs,
    UserRecs,
    Detail,
    /// One slot per listing category, so rows load side by side
    Listing(Category),
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Suggest => f.write_str("suggest"),
            Self::Search => f.write_str("search"),
            Self::SearchRecs => f.write_str("search-recs"),
            Self::ItemRecs => f.write_str("item-recs"),
            Self::UserRecs => f.write_str("user-recs"),
            Self::Detail => f.write_str("detail"),
            Self::Listing(category) => write!(f, "listing:{}", category),
        }
    }
}

/// Lifecycle of the latest request of one kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    Pending,
    Resolved,
    Cancelled,
    Failed,
}

/// What a slot hands back to its caller
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Completed(T),
    /// Superseded or explicitly cancelled; the caller must do nothing
    Cancelled,
}

/// Classifies a finished operation as resolved or failed
pub trait Settle {
    fn failed(&self) -> bool;
}

impl<T, E> Settle for Result<T, E> {
    fn failed(&self) -> bool {
        self.is_err()
    }
}

struct Pending {
    id: u64,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Inner {
    live: HashMap<OperationKind, Pending>,
    states: HashMap<OperationKind, SlotState>,
}

/// Per-kind request slots owned by one orchestrator
#[derive(Default)]
pub struct RequestSlots {
    inner: Mutex<Inner>,
    next_id: AtomicU64,
}

impl RequestSlots {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `operation` as the live request for `kind`
    ///
    /// The operation receives the request's cancellation token. When the
    /// token fires the operation future is dropped at its current suspension
    /// point, which aborts any in-flight HTTP call.
    pub async fn run<F, Fut, T>(&self, kind: OperationKind, operation: F) -> Outcome<T>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = T>,
        T: Settle,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        {
            let mut inner = self.lock();
            let previous = inner.live.insert(
                kind.clone(),
                Pending {
                    id,
                    cancel: token.clone(),
                },
            );
            if let Some(previous) = previous {
                debug!("Superseding pending {} request #{}", kind, previous.id);
                previous.cancel.cancel();
            }
            inner.states.insert(kind.clone(), SlotState::Pending);
        }

        let guard = SlotGuard {
            slots: self,
            kind: &kind,
            id,
            armed: true,
        };

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = operation(token.clone()) => Some(result),
        };
        guard.disarm();

        let mut inner = self.lock();
        let still_live = inner.live.get(&kind).map(|p| p.id) == Some(id);

        match result {
            Some(value) if still_live => {
                inner.live.remove(&kind);
                let state = if value.failed() {
                    SlotState::Failed
                } else {
                    SlotState::Resolved
                };
                inner.states.insert(kind, state);
                Outcome::Completed(value)
            }
            // Finished after a newer request took the slot; the newer one owns the state.
            Some(_) => {
                debug!("Discarding late {} response #{}", kind, id);
                Outcome::Cancelled
            }
            None => Outcome::Cancelled,
        }
    }

    /// Release `kind` if request `id` still holds it
    fn abandon(&self, kind: &OperationKind, id: u64) {
        let mut inner = self.lock();
        if inner.live.get(kind).map(|p| p.id) != Some(id) {
            return;
        }
        if let Some(pending) = inner.live.remove(kind) {
            debug!("Abandoned {} request #{}", kind, id);
            pending.cancel.cancel();
            inner.states.insert(kind.clone(), SlotState::Cancelled);
        }
    }

    /// Cancel the live request of `kind`, if any
    pub fn cancel(&self, kind: &OperationKind) -> bool {
        let mut inner = self.lock();
        match inner.live.remove(kind) {
            Some(pending) => {
                pending.cancel.cancel();
                inner.states.insert(kind.clone(), SlotState::Cancelled);
                true
            }
            None => false,
        }
    }

    /// Cancel every live request
    pub fn cancel_all(&self) {
        let mut inner = self.lock();
        let kinds: Vec<_> = inner.live.drain().collect();
        for (kind, pending) in kinds {
            pending.cancel.cancel();
            inner.states.insert(kind, SlotState::Cancelled);
        }
    }

    pub fn state(&self, kind: &OperationKind) -> SlotState {
        self.lock()
            .states
            .get(kind)
            .copied()
            .unwrap_or(SlotState::Idle)
    }

    pub fn is_live(&self, kind: &OperationKind) -> bool {
        self.lock().live.contains_key(kind)
    }
}

/// Releases the slot when a `run` future is dropped before it settles
struct SlotGuard<'a> {
    slots: &'a RequestSlots,
    kind: &'a OperationKind,
    id: u64,
    armed: bool,
}

impl SlotGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.slots.abandon(self.kind, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::sleep;

    async fn after(ms: u64, value: &'static str) -> Result<&'static str, ()> {
        sleep(Duration::from_millis(ms)).await;
        Ok(value)
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_request_supersedes_older() {
        let slots = RequestSlots::new();

        // A would resolve after B; only B may be delivered.
        let (a, b) = tokio::join!(
            slots.run(OperationKind::Search, |_| after(100, "a")),
            slots.run(OperationKind::Search, |_| after(10, "b")),
        );

        assert_eq!(a, Outcome::Cancelled);
        assert_eq!(b, Outcome::Completed(Ok("b")));
        assert_eq!(slots.state(&OperationKind::Search), SlotState::Resolved);
        assert!(!slots.is_live(&OperationKind::Search));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_request_does_not_clear_newer_pending() {
        let slots = Arc::new(RequestSlots::new());

        let first = tokio::spawn({
            let slots = slots.clone();
            async move { slots.run(OperationKind::Suggest, |_| after(50, "a")).await }
        });
        tokio::task::yield_now().await;

        let second = tokio::spawn({
            let slots = slots.clone();
            async move { slots.run(OperationKind::Suggest, |_| after(500, "b")).await }
        });
        tokio::task::yield_now().await;

        assert_eq!(first.await.unwrap(), Outcome::Cancelled);
        assert!(slots.is_live(&OperationKind::Suggest));
        assert_eq!(slots.state(&OperationKind::Suggest), SlotState::Pending);

        assert_eq!(second.await.unwrap(), Outcome::Completed(Ok("b")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_kinds_are_independent() {
        let slots = RequestSlots::new();

        let (search, recs) = tokio::join!(
            slots.run(OperationKind::Search, |_| after(100, "search")),
            slots.run(OperationKind::SearchRecs, |_| after(10, "recs")),
        );

        assert_eq!(search, Outcome::Completed(Ok("search")));
        assert_eq!(recs, Outcome::Completed(Ok("recs")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_reaches_operation() {
        let slots = Arc::new(RequestSlots::new());
        let observed = Arc::new(Mutex::new(None));

        let task = tokio::spawn({
            let slots = slots.clone();
            let observed = observed.clone();
            async move {
                slots
                    .run(OperationKind::ItemRecs, |token| async move {
                        *observed.lock().unwrap() = Some(token.clone());
                        sleep(Duration::from_secs(10)).await;
                        Ok::<_, ()>(())
                    })
                    .await
            }
        });
        tokio::task::yield_now().await;

        assert!(slots.cancel(&OperationKind::ItemRecs));
        assert_eq!(task.await.unwrap(), Outcome::Cancelled);

        let token = observed.lock().unwrap().clone().unwrap();
        assert!(token.is_cancelled());
        assert_eq!(slots.state(&OperationKind::ItemRecs), SlotState::Cancelled);
        assert!(!slots.cancel(&OperationKind::ItemRecs));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_caller_releases_slot() {
        let slots = RequestSlots::new();
        let observed = Arc::new(Mutex::new(None));

        let elapsed = tokio::time::timeout(
            Duration::from_millis(10),
            slots.run(OperationKind::Search, {
                let observed = observed.clone();
                move |token| async move {
                    *observed.lock().unwrap() = Some(token.clone());
                    sleep(Duration::from_secs(60)).await;
                    Ok::<_, ()>(())
                }
            }),
        )
        .await;

        assert!(elapsed.is_err());
        assert!(!slots.is_live(&OperationKind::Search));
        assert_eq!(slots.state(&OperationKind::Search), SlotState::Cancelled);
        assert!(observed.lock().unwrap().clone().unwrap().is_cancelled());

        // The slot is usable again afterwards.
        let outcome = slots.run(OperationKind::Search, |_| after(5, "next")).await;
        assert_eq!(outcome, Outcome::Completed(Ok("next")));
        assert_eq!(slots.state(&OperationKind::Search), SlotState::Resolved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_superseded_caller_keeps_newer_request() {
        let slots = Arc::new(RequestSlots::new());

        let older = tokio::spawn({
            let slots = slots.clone();
            async move { slots.run(OperationKind::Suggest, |_| after(1_000, "a")).await }
        });
        tokio::task::yield_now().await;

        let newer = tokio::spawn({
            let slots = slots.clone();
            async move { slots.run(OperationKind::Suggest, |_| after(500, "b")).await }
        });
        tokio::task::yield_now().await;

        older.abort();
        let _ = older.await;

        assert!(slots.is_live(&OperationKind::Suggest));
        assert_eq!(newer.await.unwrap(), Outcome::Completed(Ok("b")));
    }

    #[tokio::test]
    async fn test_failed_state() {
        let slots = RequestSlots::new();
        assert_eq!(slots.state(&OperationKind::UserRecs), SlotState::Idle);

        let outcome = slots
            .run(OperationKind::UserRecs, |_| async { Err::<(), _>("boom") })
            .await;

        assert_eq!(outcome, Outcome::Completed(Err("boom")));
        assert_eq!(slots.state(&OperationKind::UserRecs), SlotState::Failed);
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(OperationKind::SearchRecs.to_string(), "search-recs");
        assert_eq!(
            OperationKind::Listing(Category::TopRated).to_string(),
            "listing:top-rated"
        );
    }
}
