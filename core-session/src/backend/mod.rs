//! Native audio backends.
//!
//! [`AudioBackend`] is the seam between the backend-agnostic coordinator and
//! the two host audio models. Exactly one implementation is chosen when the
//! session starts:
//!
//! - [`RouteBackend`] over a [`RouteSessionBridge`](bridge_traits::RouteSessionBridge)
//! - [`FocusBackend`] over a [`FocusDeviceBridge`](bridge_traits::FocusDeviceBridge)
//!
//! Backends never publish directly. Everything they observe is pushed as a
//! [`BackendSignal`] into one unbounded channel drained by the coordinator's
//! notification pump, which serializes event publishing and refresh
//! scheduling.

use std::fmt;

use async_trait::async_trait;
use bridge_traits::route::RouteChangeReason;
use core_async::sync::{mpsc, CancellationToken};
use core_async::task::JoinHandle;
use core_runtime::logging::redact_if_sensitive;

use crate::configuration::{ActivationRequest, CategorySettings};
use crate::error::Result;
use crate::model::{AudioDevice, DeviceSnapshot, DevicesChangedEvent, InterruptionEvent};

pub mod focus;
pub mod route;

pub use focus::FocusBackend;
pub use route::RouteBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Route,
    Focus,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Route => f.write_str("route"),
            BackendKind::Focus => f.write_str("focus"),
        }
    }
}

/// Something a backend observed that the coordinator must act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendSignal {
    Interruption(InterruptionEvent),
    BecomingNoisy,
    /// Devices appeared or disappeared; also triggers a debounced refresh.
    DevicesChanged(DevicesChangedEvent),
    /// The route changed for any reason; triggers a debounced refresh.
    RouteChanged(RouteChangeReason),
}

pub type SignalSender = mpsc::UnboundedSender<BackendSignal>;
pub type SignalReceiver = mpsc::UnboundedReceiver<BackendSignal>;

/// Devices rendered for logs with names and hardware addresses masked.
pub(crate) fn loggable_devices(devices: &[AudioDevice]) -> Vec<String> {
    devices
        .iter()
        .map(|device| {
            format!(
                "{:?} {} ({})",
                device.device_type,
                redact_if_sensitive("id", &device.id),
                redact_if_sensitive("device_name", &device.name)
            )
        })
        .collect()
}

/// Capability interface over one native audio model.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Queries the devices for the requested directions.
    async fn query_devices(&self, include_inputs: bool, include_outputs: bool)
        -> Result<DeviceSnapshot>;

    /// Activates or deactivates audio. Native failures are logged and
    /// reported as `false`.
    async fn set_active(&self, active: bool, request: &ActivationRequest) -> bool;

    /// Applies category settings if they differ from the effective ones.
    ///
    /// Returns `Ok(true)` if a change was applied.
    async fn apply_category(&self, settings: &CategorySettings) -> Result<bool>;

    async fn is_in_call(&self) -> Result<bool>;

    /// Subscribes to native notifications and spawns the listener that
    /// forwards them as signals until `cancel` fires.
    async fn start(&self, cancel: CancellationToken) -> Result<JoinHandle<()>>;
}
