//! Runtime abstraction layer for the audio session core.
//!
//! Every `core-*` crate goes through this crate instead of depending on Tokio
//! directly, so the executor can be swapped for a host-provided one without
//! touching the reconciliation logic.
//!
//! # Modules
//!
//! - `task`: Task spawning and execution
//! - `time`: Time-related operations (sleep, duration, instant)
//! - `sync`: Synchronization primitives (Mutex, channels, cancellation)
//! - `runtime`: Access to the executor handle and `block_on`
//! - `debounce`: Trailing-edge coalescing of bursty triggers
//!
//! # Examples
//!
//! ```rust
//! use core_async::debounce::Debouncer;
//! use core_async::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let debouncer = Debouncer::new(Duration::from_millis(100));
//!
//! // Three route-change notifications in a row produce one refresh.
//! for _ in 0..3 {
//!     debouncer.schedule(|| async {
//!         println!("refreshing devices");
//!     });
//! }
//! # }
//! ```

pub mod debounce;
pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use debounce::Debouncer;
pub use task::spawn;
pub use time::{sleep, Duration, Instant};
