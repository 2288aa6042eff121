//! Backend over the focus/device model.
//!
//! Focus callbacks can fire on any host thread, so the translator for the
//! current focus grant lives behind a plain mutex together with a generation
//! counter. Each `request_focus` captures the generation it was issued with;
//! callbacks from an abandoned grant see a newer generation and are dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bridge_traits::focus::{
    DeviceFlags, FocusChange, FocusChangeCallback, FocusDeviceBridge, FocusNotification,
    FocusNotificationStream, NativeDeviceInfo,
};
use core_async::sync::CancellationToken;
use core_async::task::{self, JoinHandle};
use tracing::{debug, warn};

use super::{loggable_devices, AudioBackend, BackendKind, BackendSignal, SignalSender};
use crate::configuration::{ActivationRequest, CategorySettings};
use crate::error::{Result, SessionError};
use crate::interruption::FocusTranslator;
use crate::model::{AudioDevice, DeviceSnapshot, DevicesChangedEvent};
use crate::normalize;

#[derive(Debug, Default)]
struct FocusCycle {
    generation: u64,
    translator: Option<FocusTranslator>,
}

pub struct FocusBackend {
    bridge: Arc<dyn FocusDeviceBridge>,
    signals: SignalSender,
    cycle: Arc<Mutex<FocusCycle>>,
}

impl FocusBackend {
    pub fn new(bridge: Arc<dyn FocusDeviceBridge>, signals: SignalSender) -> Self {
        Self {
            bridge,
            signals,
            cycle: Arc::new(Mutex::new(FocusCycle::default())),
        }
    }

    /// Starts a new focus cycle and returns its generation.
    fn begin_cycle(&self, pause_when_ducked: bool) -> u64 {
        let mut cycle = lock(&self.cycle);
        cycle.generation = cycle.generation.wrapping_add(1);
        cycle.translator = Some(FocusTranslator::new(pause_when_ducked));
        cycle.generation
    }

    /// Invalidates every callback issued so far.
    fn end_cycle(&self) {
        let mut cycle = lock(&self.cycle);
        cycle.generation = cycle.generation.wrapping_add(1);
        cycle.translator = None;
    }

    fn focus_callback(&self, generation: u64) -> FocusChangeCallback {
        let cycle = Arc::clone(&self.cycle);
        let signals = self.signals.clone();

        Arc::new(move |change: FocusChange| {
            let mut cycle = lock(&cycle);
            if cycle.generation != generation {
                debug!(%change, "Ignoring focus change from an abandoned request");
                return;
            }
            let Some(translator) = cycle.translator.as_mut() else {
                debug!(%change, "Ignoring focus change after permanent loss");
                return;
            };

            let event = translator.translate(change);
            if change == FocusChange::Loss {
                cycle.translator = None;
            }
            // Sent under the lock so concurrent callbacks stay ordered.
            let _ = signals.send(BackendSignal::Interruption(event));
        })
    }

    async fn activate(&self, request: &ActivationRequest) -> bool {
        let generation = self.begin_cycle(request.focus.will_pause_when_ducked);
        let callback = self.focus_callback(generation);

        match self.bridge.request_focus(request.focus, callback).await {
            Ok(true) => true,
            Ok(false) => {
                debug!(gain_type = ?request.focus.gain_type, "Focus request denied");
                self.end_cycle();
                false
            }
            Err(err) => {
                warn!(error = %err, "Focus request failed");
                self.end_cycle();
                false
            }
        }
    }

    async fn deactivate(&self) -> bool {
        self.end_cycle();

        match self.bridge.abandon_focus().await {
            Ok(abandoned) => abandoned,
            Err(err) => {
                warn!(error = %err, "Failed to abandon focus");
                false
            }
        }
    }
}

#[async_trait]
impl AudioBackend for FocusBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Focus
    }

    async fn query_devices(
        &self,
        include_inputs: bool,
        include_outputs: bool,
    ) -> Result<DeviceSnapshot> {
        let Some(flags) = DeviceFlags::from_directions(include_inputs, include_outputs) else {
            return Ok(DeviceSnapshot::default());
        };

        let devices = self.bridge.devices(flags).await?;
        Ok(devices.iter().map(normalize::native_device).collect())
    }

    async fn set_active(&self, active: bool, request: &ActivationRequest) -> bool {
        if active {
            self.activate(request).await
        } else {
            self.deactivate().await
        }
    }

    async fn apply_category(&self, _settings: &CategorySettings) -> Result<bool> {
        // Categories do not exist in the focus model.
        Ok(false)
    }

    async fn is_in_call(&self) -> Result<bool> {
        Ok(self.bridge.mode().await?.is_call())
    }

    async fn start(&self, cancel: CancellationToken) -> Result<JoinHandle<()>> {
        let stream = self
            .bridge
            .subscribe()
            .await
            .map_err(|source| SessionError::SubscriptionFailed {
                backend: BackendKind::Focus,
                source,
            })?;

        Ok(task::spawn(listen(stream, self.signals.clone(), cancel)))
    }
}

async fn listen(
    mut stream: Box<dyn FocusNotificationStream>,
    signals: SignalSender,
    cancel: CancellationToken,
) {
    loop {
        let notification = tokio::select! {
            _ = cancel.cancelled() => break,
            notification = stream.next() => notification,
        };

        let Some(notification) = notification else {
            debug!("Focus notification stream closed");
            break;
        };

        let _ = signals.send(translate_notification(notification));
    }
}

fn translate_notification(notification: FocusNotification) -> BackendSignal {
    match notification {
        FocusNotification::DevicesAdded(devices) => {
            let added = normalize_all(&devices);
            debug!(added = ?loggable_devices(&added), "Devices added");
            BackendSignal::DevicesChanged(DevicesChangedEvent::added(added))
        }
        FocusNotification::DevicesRemoved(devices) => {
            let removed = normalize_all(&devices);
            debug!(removed = ?loggable_devices(&removed), "Devices removed");
            BackendSignal::DevicesChanged(DevicesChangedEvent::removed(removed))
        }
        FocusNotification::BecomingNoisy => BackendSignal::BecomingNoisy,
    }
}

fn normalize_all(devices: &[NativeDeviceInfo]) -> Vec<AudioDevice> {
    devices.iter().map(normalize::native_device).collect()
}

fn lock(cycle: &Mutex<FocusCycle>) -> MutexGuard<'_, FocusCycle> {
    cycle.lock().unwrap_or_else(PoisonError::into_inner)
}
