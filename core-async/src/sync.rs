//! Synchronization primitives.
//!
//! All primitives are async-aware and `Send + Sync`. Use these for state that
//! is held across `.await` points (for example the previous route while the
//! current route is being queried); short, non-async critical sections can keep
//! using `std::sync::Mutex`.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::Mutex;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mutex = Mutex::new(0);
//! *mutex.lock().await += 1;
//! assert_eq!(*mutex.lock().await, 1);
//! # }
//! ```

pub use tokio::sync::{
    broadcast, mpsc, oneshot, watch, Mutex, MutexGuard, Notify, RwLock, RwLockReadGuard,
    RwLockWriteGuard,
};

pub use tokio_util::sync::{CancellationToken, DropGuard, WaitForCancellationFuture};
