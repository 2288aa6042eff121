//! Marker traits keeping bridge trait bounds in one place.
//!
//! Native callbacks from both audio stacks arrive on threads the core does not
//! own (the main run loop on one platform, a binder thread on the other), so
//! every bridge object must be shareable across threads.

/// Marker trait for bridge objects shared across tasks and callback threads.
pub trait PlatformSendSync: Send + Sync {}

impl<T> PlatformSendSync for T where T: Send + Sync {}

/// Marker trait for values moved into a listener task.
pub trait PlatformSend: Send {}

impl<T> PlatformSend for T where T: Send {}
