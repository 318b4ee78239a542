//! Single-assignment asynchronous result slot.
//!
//! A [`Promise`] holds the eventual outcome of one protocol request. The
//! dispatch loop resolves it exactly once; the sender awaits it with a
//! deadline. Resolution is first-writer-wins: a late network response that
//! races an already-failed slot is silently ignored rather than treated as
//! an error.
//!
//! # Example
//!
//! ```ignore
//! let promise: Promise<u32> = Promise::new();
//! let handle = promise.clone();
//!
//! tokio::spawn(async move {
//!     handle.fulfill(42);
//! });
//!
//! let value = promise.wait(Duration::from_secs(5)).await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::timeout;

use crate::error::{Error, Result};

// ============================================================================
// State
// ============================================================================

/// Internal slot state. Transitions are one-way:
/// `Pending -> Fulfilled | Failed -> Taken`.
enum State<T> {
    /// No writer has resolved the slot yet.
    Pending,
    /// Resolved with a value.
    Fulfilled(T),
    /// Resolved with an error.
    Failed(Error),
    /// Resolved and consumed by a waiter.
    Taken,
}

impl<T> State<T> {
    fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

// ============================================================================
// Promise
// ============================================================================

/// A thread-safe, single-assignment result slot.
///
/// Cloning yields another handle to the same slot. Any handle may resolve
/// the slot; the first writer wins and later attempts are no-ops. The
/// resolved value is consumed by the first waiter that observes it.
pub struct Promise<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    state: Mutex<State<T>>,
    notify: Notify,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Promise<T> {
    /// Creates a new pending promise.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::Pending),
                notify: Notify::new(),
            }),
        }
    }

    /// Resolves the slot with a value.
    ///
    /// Returns `true` if this call performed the resolution, `false` if the
    /// slot was already settled.
    pub fn fulfill(&self, value: T) -> bool {
        self.settle(State::Fulfilled(value))
    }

    /// Resolves the slot with an error.
    ///
    /// Returns `true` if this call performed the resolution, `false` if the
    /// slot was already settled.
    pub fn fail(&self, error: Error) -> bool {
        self.settle(State::Failed(error))
    }

    /// Returns `true` once the slot has been resolved (or consumed).
    #[inline]
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !self.inner.state.lock().is_pending()
    }

    /// Takes the resolved outcome without blocking.
    ///
    /// Returns `None` while pending, or after the outcome has already been
    /// consumed by another waiter.
    pub fn try_take(&self) -> Option<Result<T>> {
        let mut state = self.inner.state.lock();
        match std::mem::replace(&mut *state, State::Taken) {
            State::Fulfilled(value) => Some(Ok(value)),
            State::Failed(error) => Some(Err(error)),
            State::Pending => {
                *state = State::Pending;
                None
            }
            State::Taken => None,
        }
    }

    /// Suspends until the slot is settled.
    pub async fn settled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent resolution cannot
            // slip between the check and the await.
            notified.as_mut().enable();
            if self.is_settled() {
                return;
            }
            notified.await;
        }
    }

    /// Suspends until the slot is settled or the deadline elapses.
    ///
    /// A timeout does not mutate the slot: a later resolution by the
    /// dispatch loop still lands, it is simply never observed here.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if the deadline elapses first
    /// - the failure the slot was resolved with
    pub async fn wait(&self, deadline: Duration) -> Result<T> {
        if timeout(deadline, self.settled()).await.is_err() {
            return Err(Error::timeout("await promise", deadline.as_millis() as u64));
        }
        // Single-consumer contract: the outcome is taken by whoever observes
        // settlement first.
        self.try_take().unwrap_or(Err(Error::ConnectionClosed))
    }

    fn settle(&self, outcome: State<T>) -> bool {
        {
            let mut state = self.inner.state.lock();
            if !state.is_pending() {
                return false;
            }
            *state = outcome;
        }
        self.inner.notify.notify_waiters();
        true
    }
}

impl<T> std::fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        let name = match *state {
            State::Pending => "Pending",
            State::Fulfilled(_) => "Fulfilled",
            State::Failed(_) => "Failed",
            State::Taken => "Taken",
        };
        f.debug_struct("Promise").field("state", &name).finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fulfill_once() {
        let promise: Promise<u32> = Promise::new();
        assert!(!promise.is_settled());

        assert!(promise.fulfill(1));
        assert!(promise.is_settled());

        // First writer wins; later attempts are no-ops.
        assert!(!promise.fulfill(2));
        assert!(!promise.fail(Error::ConnectionClosed));

        let value = promise.try_take().expect("settled").expect("ok");
        assert_eq!(value, 1);
    }

    #[test]
    fn test_fail_then_fulfill_ignored() {
        let promise: Promise<u32> = Promise::new();
        assert!(promise.fail(Error::transport("boom")));
        assert!(!promise.fulfill(3));

        let err = promise.try_take().expect("settled").unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }

    #[test]
    fn test_try_take_pending() {
        let promise: Promise<u32> = Promise::new();
        assert!(promise.try_take().is_none());
        // Probing must not settle the slot.
        assert!(promise.fulfill(9));
    }

    #[test]
    fn test_try_take_consumes() {
        let promise: Promise<u32> = Promise::new();
        promise.fulfill(5);
        assert!(promise.try_take().is_some());
        assert!(promise.try_take().is_none());
        // Consumed still counts as settled.
        assert!(promise.is_settled());
    }

    #[tokio::test]
    async fn test_wait_resolved_by_other_task() {
        let promise: Promise<&'static str> = Promise::new();
        let resolver = promise.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            resolver.fulfill("done");
        });

        let value = promise.wait(Duration::from_secs(5)).await.expect("resolved");
        assert_eq!(value, "done");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_timeout_leaves_slot_pending() {
        let promise: Promise<u32> = Promise::new();

        let err = promise.wait(Duration::from_millis(50)).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));

        // The slot itself is untouched; a late resolution still lands.
        assert!(!promise.is_settled());
        assert!(promise.fulfill(7));
        assert_eq!(promise.try_take().expect("settled").expect("ok"), 7);
    }

    #[tokio::test]
    async fn test_wait_already_settled() {
        let promise: Promise<u32> = Promise::new();
        promise.fulfill(11);
        let value = promise.wait(Duration::from_millis(1)).await.expect("ok");
        assert_eq!(value, 11);
    }

    #[test]
    fn test_promise_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Promise<u32>>();
    }
}
