//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the audio session crates:
//! - Logging and tracing setup with host log forwarding
//! - Session configuration with fail-fast validation
//! - Broadcast and replay-last event channels
//!
//! ## Overview
//!
//! Nothing in here knows about audio devices. The session crate builds its
//! device directory and event surface on top of these primitives.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{SessionConfig, SessionConfigBuilder};
pub use error::{Error, Result};
pub use events::{EventBus, EventStream, LatestValueBus, ReplayStream};
