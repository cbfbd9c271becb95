//! Single-flight coordination of session refreshes.
//!
//! However many requests hit an expired access token at once, one refresh
//! operation runs and every caller observes its result. The slot is cleared
//! from inside the shared operation, so by the time any waiter sees the
//! outcome a new 401 will start a fresh refresh.

use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::Result;

type SharedRefresh = Shared<BoxFuture<'static, Result<()>>>;

struct InFlight {
    id: u64,
    future: SharedRefresh,
}

type Slot = Arc<Mutex<Option<InFlight>>>;

/// Holds at most one pending refresh.
#[derive(Default)]
pub struct RefreshCoordinator {
    slot: Slot,
    next_id: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the pending refresh, or start one with `start` if none is pending.
    ///
    /// `start` is only invoked when this call creates the operation.
    pub async fn run<F>(&self, start: F) -> Result<()>
    where
        F: FnOnce() -> BoxFuture<'static, Result<()>>,
    {
        // The lock is released before awaiting.
        let future = {
            let mut slot = self.slot.lock();
            match slot.as_ref() {
                Some(in_flight) => {
                    debug!(refresh_id = in_flight.id, "Joining in-flight refresh");
                    in_flight.future.clone()
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    debug!(refresh_id = id, "Starting refresh");
                    let op = start();
                    let guard = SlotGuard {
                        slot: Arc::downgrade(&self.slot),
                        id,
                    };
                    let future = async move {
                        let _guard = guard;
                        op.await
                    }
                    .boxed()
                    .shared();
                    *slot = Some(InFlight {
                        id,
                        future: future.clone(),
                    });
                    future
                }
            }
        };
        future.await
    }

    /// Whether a refresh is currently pending.
    pub fn in_flight(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// Empties the slot when the operation settles, panics or is dropped.
///
/// The shared future lives in the slot it clears, so the guard only holds a
/// weak handle to it.
struct SlotGuard {
    slot: Weak<Mutex<Option<InFlight>>>,
    id: u64,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let Some(slot) = self.slot.upgrade() else {
            return;
        };
        let finished = {
            let mut slot = slot.lock();
            if slot.as_ref().is_some_and(|f| f.id == self.id) {
                slot.take()
            } else {
                None
            }
        };
        drop(finished);
    }
}
