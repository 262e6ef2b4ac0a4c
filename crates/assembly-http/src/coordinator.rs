//! Single-flight token refresh.
//!
//! A [`RefreshCoordinator`] lets exactly one caller run the refresh call at a
//! time. Callers that hit a 401 while a refresh is running are parked in a
//! [`RequestQueue`] and all receive the outcome of that one call.
//!
//! The coordinator's state sits behind a plain mutex that is only held for
//! bookkeeping, never across an `.await`:
//!
//! ```text
//! acquire() ──► Leader(guard) ──► refresh call ──► guard.release(outcome)
//!           ├─► Queued(pending) ─────────────────► pending.wait() == outcome
//!           └─► Exhausted { attempts }
//! ```
//!
//! Dropping a [`RefreshGuard`] without releasing it (panic, cancelled future)
//! still clears the in-flight flag and rejects the queue with
//! [`AuthError::RefreshAbandoned`].

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, trace};

use assembly_core::error::AuthError;
use assembly_core::{AccessToken, Result};

/// Refresh attempts allowed in a row before the session is given up.
pub const DEFAULT_MAX_REFRESH_ATTEMPTS: u32 = 3;

/// What every participant in one refresh receives.
pub type RefreshOutcome = Result<AccessToken>;

/// Snapshot of the coordinator's bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshState {
    /// A refresh call is outstanding.
    pub is_refreshing: bool,
    /// Refresh calls issued since the last success.
    pub attempt_count: u32,
}

/// Callers waiting on the in-flight refresh, in arrival order.
#[derive(Default)]
pub struct RequestQueue {
    pending: VecDeque<oneshot::Sender<RefreshOutcome>>,
}

impl RequestQueue {
    /// Park a caller; the receiver settles when the queue is drained.
    pub fn push(&mut self) -> PendingRefresh {
        let (tx, rx) = oneshot::channel();
        self.pending.push_back(tx);
        PendingRefresh { rx }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Settle every parked caller with `outcome`. Returns how many were drained.
    pub fn drain(&mut self, outcome: &RefreshOutcome) -> usize {
        let count = self.pending.len();
        for tx in self.pending.drain(..) {
            // The receiver may be gone if its caller was cancelled.
            let _ = tx.send(outcome.clone());
        }
        count
    }
}

impl fmt::Debug for RequestQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestQueue")
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// A caller parked behind the in-flight refresh.
#[derive(Debug)]
pub struct PendingRefresh {
    rx: oneshot::Receiver<RefreshOutcome>,
}

impl PendingRefresh {
    /// Wait for the in-flight refresh to settle.
    pub async fn wait(self) -> RefreshOutcome {
        self.rx
            .await
            .unwrap_or_else(|_| Err(AuthError::RefreshAbandoned.into()))
    }
}

/// Result of [`RefreshCoordinator::acquire`].
#[derive(Debug)]
pub enum Acquire<'a> {
    /// The caller must perform the refresh and release the guard.
    Leader(RefreshGuard<'a>),
    /// A refresh is already running; wait for its outcome.
    Queued(PendingRefresh),
    /// The attempt ceiling was reached; no refresh may be started.
    Exhausted { attempts: u32 },
}

#[derive(Debug, Default)]
struct CoordinatorState {
    refresh: RefreshState,
    queue: RequestQueue,
}

/// Serializes token refreshes and fans their outcome out to waiting callers.
#[derive(Debug)]
pub struct RefreshCoordinator {
    state: Mutex<CoordinatorState>,
    max_attempts: u32,
}

impl RefreshCoordinator {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            state: Mutex::new(CoordinatorState::default()),
            max_attempts,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Join the in-flight refresh, start a new one, or learn that the
    /// attempt ceiling has been hit.
    ///
    /// A caller arriving while a refresh is running always joins it, even if
    /// that refresh used up the last attempt. The ceiling only stops a new
    /// refresh from starting.
    pub fn acquire(&self) -> Acquire<'_> {
        let mut state = self.lock();

        if state.refresh.is_refreshing {
            let pending = state.queue.push();
            trace!(queued = state.queue.len(), "joined in-flight refresh");
            return Acquire::Queued(pending);
        }

        if state.refresh.attempt_count >= self.max_attempts {
            return Acquire::Exhausted {
                attempts: state.refresh.attempt_count,
            };
        }

        state.refresh.is_refreshing = true;
        state.refresh.attempt_count += 1;
        debug!(attempt = state.refresh.attempt_count, "starting refresh");

        Acquire::Leader(RefreshGuard {
            coordinator: self,
            released: false,
        })
    }

    /// Current bookkeeping.
    pub fn state(&self) -> RefreshState {
        self.lock().refresh
    }

    /// Number of callers parked behind the in-flight refresh.
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Forget earlier failed attempts, e.g. after a fresh login.
    pub fn reset_attempts(&self) {
        self.lock().refresh.attempt_count = 0;
    }

    fn settle(&self, outcome: RefreshOutcome) {
        let mut state = self.lock();
        if outcome.is_ok() {
            state.refresh.attempt_count = 0;
        }
        let drained = state.queue.drain(&outcome);
        state.refresh.is_refreshing = false;
        drop(state);

        debug!(drained, success = outcome.is_ok(), "refresh settled");
    }
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REFRESH_ATTEMPTS)
    }
}

/// Held by the caller performing the refresh.
pub struct RefreshGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    released: bool,
}

impl RefreshGuard<'_> {
    /// End the critical section and hand `outcome` to every queued caller.
    pub fn release(mut self, outcome: RefreshOutcome) {
        self.released = true;
        self.coordinator.settle(outcome);
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.coordinator
                .settle(Err(AuthError::RefreshAbandoned.into()));
        }
    }
}

impl fmt::Debug for RefreshGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshGuard")
            .field("released", &self.released)
            .finish()
    }
}
