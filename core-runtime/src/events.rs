//! # Event Bus System
//!
//! Multi-consumer event delivery built on `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! - **EventBus**: broadcast channel for fire-and-forget events. Subscribers
//!   only see events emitted after they subscribed.
//! - **EventStream**: receiver wrapper with an optional filter predicate.
//! - **LatestValueBus**: broadcast channel that also caches the most recent
//!   value. New subscribers observe that value first, then every later
//!   publish. Used for state that a late subscriber must not miss, such as the
//!   current device snapshot.
//!
//! ## Architecture
//!
//! ```text
//!                   emit      ┌───────────┐   subscribe   ┌────────────┐
//! notification pump ─────────>│ EventBus  ├──────────────>│ Subscriber │
//!                             └───────────┘               └────────────┘
//!
//!                   publish   ┌────────────────┐  subscribe  ┌──────────────┐
//! device directory ──────────>│ LatestValueBus ├────────────>│ ReplayStream │
//!                             │  (cached last) │             │ latest, then │
//!                             └────────────────┘             │ live values  │
//!                                                            └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::EventBus;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus: EventBus<String> = EventBus::new(16);
//! let mut stream = bus.subscribe();
//!
//! bus.emit("headphones unplugged".to_string()).ok();
//! assert_eq!(stream.recv().await.unwrap(), "headphones unplugged");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Receivers can observe two errors:
//!
//! - **`RecvError::Lagged(n)`**: the subscriber fell `n` events behind. It can
//!   keep receiving newer events.
//! - **`RecvError::Closed`**: every sender was dropped; treat it as shutdown.
//!
//! `emit` fails only when there are no subscribers, which callers typically
//! ignore.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for event channels.
///
/// Subscribers that can't keep up receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Event Bus
// ============================================================================

/// Broadcast channel for events of type `E`.
///
/// Cloning the bus is cheap; clones publish into the same channel.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::EventBus;
///
/// let bus: EventBus<u32> = EventBus::new(8);
/// assert_eq!(bus.subscriber_count(), 0);
///
/// let _subscriber = bus.subscribe();
/// assert_eq!(bus.subscriber_count(), 1);
/// ```
pub struct EventBus<E> {
    sender: broadcast::Sender<E>,
}

impl<E: Clone> EventBus<E> {
    /// Creates a new bus buffering at most `capacity` events per subscriber.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. [`SessionConfig`](crate::config::SessionConfig)
    /// rejects a zero buffer size before it gets here.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none.
    pub fn emit(&self, event: E) -> Result<usize, SendError<E>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<E> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<E: Clone> Default for EventBus<E> {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.sender.receiver_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream};
///
/// # #[tokio::main]
/// # async fn main() {
/// let bus: EventBus<i32> = EventBus::new(8);
/// let mut negatives = EventStream::new(bus.subscribe()).filter(|value| *value < 0);
///
/// bus.emit(3).ok();
/// bus.emit(-1).ok();
/// assert_eq!(negatives.recv().await.unwrap(), -1);
/// # }
/// ```
pub struct EventStream<E> {
    receiver: Receiver<E>,
    filter: Option<EventFilter<E>>,
}

impl<E: Clone> EventStream<E> {
    pub fn new(receiver: Receiver<E>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<E, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without waiting.
    ///
    /// Returns `None` if no matching event is currently available.
    pub fn try_recv(&mut self) -> Option<Result<E, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    fn matches(&self, event: &E) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }
}

impl<E> fmt::Debug for EventStream<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Replay-last Bus
// ============================================================================

struct LatestShared<T> {
    latest: Mutex<Option<T>>,
    sender: broadcast::Sender<T>,
}

/// Broadcast channel that remembers the last published value.
///
/// Publishing and subscribing take the same lock, so a subscriber sees every
/// value exactly once: either as its replayed starting value or as a live
/// update, never both and never neither.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::LatestValueBus;
///
/// # #[tokio::main]
/// # async fn main() {
/// let bus: LatestValueBus<u32> = LatestValueBus::new(8);
/// bus.publish(1);
///
/// let mut late = bus.subscribe();
/// assert_eq!(late.recv().await.unwrap(), 1);
///
/// bus.publish(2);
/// assert_eq!(late.recv().await.unwrap(), 2);
/// # }
/// ```
pub struct LatestValueBus<T> {
    shared: Arc<LatestShared<T>>,
}

impl<T: Clone> LatestValueBus<T> {
    /// Creates an empty bus. Nothing is replayed until the first publish.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            shared: Arc::new(LatestShared {
                latest: Mutex::new(None),
                sender,
            }),
        }
    }

    /// Caches `value` and delivers it to every live subscriber.
    pub fn publish(&self, value: T) {
        let mut latest = self.lock();
        *latest = Some(value.clone());
        // No receivers is fine: the value stays cached for later subscribers.
        let _ = self.shared.sender.send(value);
    }

    /// Publishes `candidate` only if `differs(current, candidate)` holds.
    ///
    /// With nothing cached yet the candidate is always published. The
    /// comparison and the replacement happen under one lock. Returns `true`
    /// if the value was published.
    pub fn publish_if<F>(&self, candidate: T, differs: F) -> bool
    where
        F: FnOnce(&T, &T) -> bool,
    {
        let mut latest = self.lock();
        let changed = match latest.as_ref() {
            Some(current) => differs(current, &candidate),
            None => true,
        };

        if changed {
            *latest = Some(candidate.clone());
            let _ = self.shared.sender.send(candidate);
        }

        changed
    }

    /// Returns a copy of the cached value.
    pub fn latest(&self) -> Option<T> {
        self.lock().clone()
    }

    /// Subscribes, starting with the cached value if there is one.
    pub fn subscribe(&self) -> ReplayStream<T> {
        let latest = self.lock();
        ReplayStream {
            pending: latest.clone(),
            receiver: self.shared.sender.subscribe(),
        }
    }

    /// Returns the number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.shared.sender.receiver_count()
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.shared
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Clone for LatestValueBus<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for LatestValueBus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LatestValueBus")
            .field("subscriber_count", &self.shared.sender.receiver_count())
            .finish()
    }
}

/// Receiver of a [`LatestValueBus`].
pub struct ReplayStream<T> {
    pending: Option<T>,
    receiver: Receiver<T>,
}

impl<T: Clone> ReplayStream<T> {
    /// Returns the replayed value first, then live values.
    ///
    /// # Errors
    ///
    /// Same as [`EventStream::recv`].
    pub async fn recv(&mut self) -> Result<T, RecvError> {
        if let Some(value) = self.pending.take() {
            return Ok(value);
        }
        self.receiver.recv().await
    }

    /// Non-waiting variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<Result<T, RecvError>> {
        if let Some(value) = self.pending.take() {
            return Some(Ok(value));
        }
        match self.receiver.try_recv() {
            Ok(value) => Some(Ok(value)),
            Err(broadcast::error::TryRecvError::Empty) => None,
            Err(broadcast::error::TryRecvError::Lagged(n)) => Some(Err(RecvError::Lagged(n))),
            Err(broadcast::error::TryRecvError::Closed) => Some(Err(RecvError::Closed)),
        }
    }
}

impl<T> fmt::Debug for ReplayStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplayStream")
            .field("has_pending", &self.pending.is_some())
            .finish()
    }
}
