//! Audio session engine.
//!
//! Host applications depend on this crate alone and get the session
//! coordinator, the bridge traits they implement, and the runtime
//! configuration in one place.
//!
//! ```no_run
//! use audio_session::{AudioSession, SessionConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = AudioSession::init(SessionConfig::builder().build()?).await?;
//! let devices = session.get_devices(true, true).await?;
//! println!("{} devices", devices.len());
//! # Ok(())
//! # }
//! ```

pub use bridge_traits;
pub use core_runtime;
pub use core_session;

pub use bridge_traits::{BridgeError, FocusDeviceBridge, LoggerSink, RouteSessionBridge};
pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
pub use core_runtime::SessionConfig;
pub use core_session::{
    ActivationOptions, AudioDevice, AudioSession, AudioSessionConfiguration, DeviceSnapshot,
    DeviceType, DevicesChangedEvent, InterruptionEvent, InterruptionType, SessionError,
    SessionEvent,
};
