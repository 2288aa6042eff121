//! Runtime utilities that abstract over the underlying async executor.
//!
//! Native callbacks (focus changes, logger forwarding) can arrive on threads
//! that are not driven by the executor. These helpers let such code find the
//! running runtime or fall back to a private one.

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs the provided future to completion on a throwaway current-thread runtime.
///
/// # Panics
///
/// Panics if called from within an async context, or if the runtime cannot be
/// built (which only happens when the OS refuses to create the I/O driver).
pub fn block_on<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("core_async::runtime::block_on: failed to build Tokio runtime")
        .block_on(future)
}

/// Returns a handle to the runtime driving the current thread, if any.
pub fn current_handle() -> Option<Handle> {
    Handle::try_current().ok()
}
