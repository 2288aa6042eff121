//! # Host Bridge Traits
//!
//! Capabilities the audio session engine needs from the host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the session core and the
//! platform-specific adapters. Two audio models are supported and a host
//! implements exactly one of them:
//!
//! - [`RouteSessionBridge`](route::RouteSessionBridge): a single process-wide
//!   session with a category, mode and an active route of ports.
//! - [`FocusDeviceBridge`](focus::FocusDeviceBridge): audio focus requests plus
//!   direct device enumeration with integer type codes.
//!
//! Both expose their asynchronous notifications as streams
//! ([`RouteNotificationStream`](route::RouteNotificationStream),
//! [`FocusNotificationStream`](focus::FocusNotificationStream)) that the core
//! drains on its own task.
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Adapters should
//! convert native errors into it and keep the native error code in
//! [`BridgeError::Rejected`] when the host refused a request.
//!
//! ## Thread Safety
//!
//! Bridge traits require `Send + Sync`; hosts may deliver callbacks on any
//! thread.
//!
//! ## Example
//!
//! ```ignore
//! use bridge_traits::focus::{AudioMode, FocusDeviceBridge};
//! use bridge_traits::error::Result;
//!
//! async fn in_call(bridge: &dyn FocusDeviceBridge) -> Result<bool> {
//!     Ok(bridge.mode().await?.is_call())
//! }
//! ```

pub mod error;
pub mod focus;
pub mod logging;
pub mod platform;
pub mod route;

pub use error::BridgeError;

// Re-export commonly used types
pub use focus::{
    AudioAttributes, AudioMode, DeviceFlags, FocusChange, FocusChangeCallback, FocusDeviceBridge,
    FocusGainType, FocusNotification, FocusNotificationStream, FocusRequest, NativeDeviceInfo,
    NativeDeviceType,
};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use route::{
    AudioRoute, CategoryOptions, InterruptionNotification, InterruptionOptions, PortType,
    RouteChangeReason, RouteNotification, RouteNotificationStream, RoutePort,
    RouteSessionBridge, RouteSharingPolicy, SessionCategory, SessionMode, SetActiveOptions,
};
