//! Trailing-edge debouncing.
//!
//! Native audio stacks report device changes in bursts: plugging in a headset
//! produces a route change, an input-added and an output-added notification
//! within a few milliseconds. [`Debouncer`] coalesces such a burst into a single
//! delayed action.
//!
//! Semantics:
//! - `schedule` cancels the pending action (if it has not started yet) and arms
//!   the new one to run after the quiet window.
//! - Of a burst of `schedule` calls closer together than the window, exactly one
//!   action runs: the most recently supplied one. Earlier actions are dropped
//!   without running.
//! - An action that has already started is never interrupted by a later
//!   `schedule`; the later action simply runs after its own window.
//! - There is no queueing and no leading-edge execution.
//!
//! Dropping the debouncer abandons a pending action.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::task::{self, JoinHandle};
use crate::time::{sleep, Duration};

/// Default quiet window used for device refreshes.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

#[derive(Default)]
struct Slot {
    /// Incremented on every `schedule`; a woken action only runs if it still
    /// holds the latest generation.
    generation: u64,
    /// Handle of the armed action. Cleared by the action itself once it starts.
    pending: Option<JoinHandle<()>>,
}

/// Coalesces bursts of triggers into one trailing execution.
///
/// # Example
///
/// ```rust
/// use core_async::debounce::Debouncer;
/// use core_async::time::{sleep, Duration};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() {
/// let runs = Arc::new(AtomicUsize::new(0));
/// let debouncer = Debouncer::new(Duration::from_millis(20));
///
/// for _ in 0..5 {
///     let runs = Arc::clone(&runs);
///     debouncer.schedule(move || async move {
///         runs.fetch_add(1, Ordering::SeqCst);
///     });
/// }
///
/// sleep(Duration::from_millis(60)).await;
/// assert_eq!(runs.load(Ordering::SeqCst), 1);
/// # }
/// ```
pub struct Debouncer {
    delay: Duration,
    slot: Arc<Mutex<Slot>>,
}

impl Debouncer {
    /// Creates a debouncer with the given quiet window.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Returns the quiet window.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replaces any pending action with `action`, to run once the quiet window
    /// elapses without another call.
    ///
    /// Must be called from within a runtime context.
    pub fn schedule<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut slot = lock(&self.slot);
        slot.generation = slot.generation.wrapping_add(1);
        let generation = slot.generation;

        if let Some(previous) = slot.pending.take() {
            trace!(generation, "Discarding pending debounced action");
            previous.abort();
        }

        let delay = self.delay;
        let shared = Arc::clone(&self.slot);
        slot.pending = Some(task::spawn(async move {
            sleep(delay).await;

            {
                let mut slot = lock(&shared);
                if slot.generation != generation {
                    return;
                }
                // From here on the action is committed and cannot be aborted.
                slot.pending = None;
            }

            action().await;
        }));
    }

    /// Returns `true` while an action is armed but has not started yet.
    pub fn is_pending(&self) -> bool {
        lock(&self.slot).pending.is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(pending) = lock(&self.slot).pending.take() {
            pending.abort();
        }
    }
}

impl std::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("pending", &self.is_pending())
            .finish()
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
