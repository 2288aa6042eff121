//! Backend over the linear session/route model.

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::route::{
    AudioRoute, RouteChangeReason, RouteNotification, RouteNotificationStream, RoutePort,
    RouteSessionBridge,
};
use core_async::sync::{CancellationToken, Mutex};
use core_async::task::{self, JoinHandle};
use tracing::{debug, instrument, trace, warn};

use super::{loggable_devices, AudioBackend, BackendKind, BackendSignal, SignalSender};
use crate::configuration::{ActivationRequest, CategorySettings};
use crate::directory;
use crate::error::{Result, SessionError};
use crate::interruption::translate_route_interruption;
use crate::model::{DeviceSnapshot, DevicesChangedEvent};
use crate::normalize;

pub struct RouteBackend {
    bridge: Arc<dyn RouteSessionBridge>,
    listener: Arc<RouteListener>,
}

impl RouteBackend {
    pub fn new(bridge: Arc<dyn RouteSessionBridge>, signals: SignalSender) -> Self {
        let listener = Arc::new(RouteListener {
            bridge: Arc::clone(&bridge),
            signals,
            previous_route: Mutex::new(None),
        });
        Self { bridge, listener }
    }
}

#[async_trait]
impl AudioBackend for RouteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Route
    }

    async fn query_devices(
        &self,
        include_inputs: bool,
        include_outputs: bool,
    ) -> Result<DeviceSnapshot> {
        if !include_inputs && !include_outputs {
            return Ok(DeviceSnapshot::default());
        }

        let (route, available) =
            futures::try_join!(self.bridge.current_route(), self.bridge.available_inputs())?;

        // Inputs the session could switch to plus the ones it is using.
        let inputs = merge_ports(&available, &route.inputs);
        let outputs: &[RoutePort] = if include_outputs { &route.outputs } else { &[] };
        let snapshot = normalize::ports_snapshot(&inputs, outputs);

        if include_inputs {
            Ok(snapshot)
        } else {
            // Keep the input context for headphone classification, drop the inputs.
            Ok(snapshot.iter().filter(|device| device.is_output).cloned().collect())
        }
    }

    async fn set_active(&self, active: bool, request: &ActivationRequest) -> bool {
        match self.bridge.set_active(active, request.set_active_options).await {
            Ok(()) => true,
            Err(err) => {
                warn!(active, error = %err, "Failed to change session activation");
                false
            }
        }
    }

    #[instrument(skip(self), fields(backend = "route"))]
    async fn apply_category(&self, settings: &CategorySettings) -> Result<bool> {
        // Sequential queries, stopping at the first mismatch.
        let unchanged = self.bridge.category().await? == settings.category
            && self.bridge.category_options().await? == settings.options
            && self.bridge.mode().await? == settings.mode
            && self.bridge.route_sharing_policy().await? == settings.policy;

        if unchanged {
            trace!("Category settings already in effect");
            return Ok(false);
        }

        self.bridge
            .set_category(
                settings.category,
                settings.options,
                settings.mode,
                settings.policy,
            )
            .await?;
        debug!("Applied category settings");
        Ok(true)
    }

    async fn is_in_call(&self) -> Result<bool> {
        Ok(self.bridge.is_in_call().await?)
    }

    async fn start(&self, cancel: CancellationToken) -> Result<JoinHandle<()>> {
        let stream = self
            .bridge
            .subscribe()
            .await
            .map_err(|source| SessionError::SubscriptionFailed {
                backend: BackendKind::Route,
                source,
            })?;

        self.listener.capture_baseline().await;

        let listener = Arc::clone(&self.listener);
        Ok(task::spawn(listener.run(stream, cancel)))
    }
}

/// Consumes session notifications and turns them into signals.
///
/// Holds the previous route as the baseline for route-change diffs. The
/// baseline lock is held across the route query so diffs serialize.
pub(crate) struct RouteListener {
    bridge: Arc<dyn RouteSessionBridge>,
    signals: SignalSender,
    previous_route: Mutex<Option<AudioRoute>>,
}

impl RouteListener {
    async fn capture_baseline(&self) {
        match self.bridge.current_route().await {
            Ok(route) => *self.previous_route.lock().await = Some(route),
            Err(err) => warn!(error = %err, "Failed to read initial route"),
        }
    }

    async fn run(self: Arc<Self>, mut stream: Box<dyn RouteNotificationStream>, cancel: CancellationToken) {
        loop {
            let notification = tokio::select! {
                _ = cancel.cancelled() => break,
                notification = stream.next() => notification,
            };

            match notification {
                Some(notification) => self.handle(notification).await,
                None => {
                    debug!("Route notification stream closed");
                    break;
                }
            }
        }
    }

    pub(crate) async fn handle(&self, notification: RouteNotification) {
        match notification {
            RouteNotification::Interruption(interruption) => {
                match translate_route_interruption(&interruption) {
                    Some(event) => self.send(BackendSignal::Interruption(event)),
                    None => debug!("Ignoring interruption that began while suspended"),
                }
            }
            RouteNotification::RouteChange { reason } => {
                debug!(?reason, "Route changed");
                let changed = self.route_delta(reason).await;

                if reason == RouteChangeReason::OldDeviceUnavailable {
                    self.send(BackendSignal::BecomingNoisy);
                }
                if !changed.is_empty() {
                    debug!(
                        added = ?loggable_devices(&changed.added),
                        removed = ?loggable_devices(&changed.removed),
                        "Route devices changed"
                    );
                    self.send(BackendSignal::DevicesChanged(changed));
                }
                self.send(BackendSignal::RouteChanged(reason));
            }
        }
    }

    /// Diffs the previous route against the current one and advances the
    /// baseline. Only arrivals and departures produce a delta.
    async fn route_delta(&self, reason: RouteChangeReason) -> DevicesChangedEvent {
        let mut previous_route = self.previous_route.lock().await;

        let current = match self.bridge.current_route().await {
            Ok(route) => route,
            Err(err) => {
                warn!(error = %err, "Failed to read route after change");
                return DevicesChangedEvent::default();
            }
        };

        let previous = previous_route
            .as_ref()
            .map(normalize::route_snapshot)
            .unwrap_or_default();
        let delta = directory::diff(previous.devices(), normalize::route_snapshot(&current).devices());
        *previous_route = Some(current);

        match reason {
            RouteChangeReason::NewDeviceAvailable => DevicesChangedEvent::added(delta.added),
            RouteChangeReason::OldDeviceUnavailable => DevicesChangedEvent::removed(delta.removed),
            _ => DevicesChangedEvent::default(),
        }
    }

    fn send(&self, signal: BackendSignal) {
        // Fails only once the pump is gone during shutdown.
        let _ = self.signals.send(signal);
    }
}

fn merge_ports(first: &[RoutePort], second: &[RoutePort]) -> Vec<RoutePort> {
    let mut merged = first.to_vec();
    for port in second {
        if !merged.iter().any(|existing| existing.uid == port.uid) {
            merged.push(port.clone());
        }
    }
    merged
}
