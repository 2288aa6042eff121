//! # Session Coordinator
//!
//! [`AudioSession`] is the single entry point an application talks to.
//!
//! ## Overview
//!
//! `init` picks the backend from whichever bridge the host configured, starts
//! its native listener and spawns the notification pump. The pump is the only
//! place session events are published from, and the only place that reacts to
//! device changes: every add, remove or route change schedules a debounced
//! refresh, which re-queries all devices and reconciles them into the
//! [`DeviceDirectory`].
//!
//! Without a bridge the session still works, it just never reports anything:
//! queries return an empty snapshot, `set_active` succeeds, `set_category` is a
//! no-op and `is_in_call` is `false`.
//!
//! ## Usage
//!
//! ```no_run
//! use core_runtime::config::SessionConfig;
//! use core_session::{ActivationOptions, AudioSession, AudioSessionConfiguration};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = AudioSession::init(SessionConfig::builder().build()?).await?;
//!
//! session.configure(AudioSessionConfiguration::music()).await;
//! let mut interruptions = session.interruption_events();
//!
//! if session.set_active(true, ActivationOptions::default()).await {
//!     let event = interruptions.recv().await?;
//!     println!("interrupted: {:?}", event);
//! }
//!
//! session.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use bridge_traits::route::{CategoryOptions, RouteSharingPolicy, SessionCategory, SessionMode};
use core_async::debounce::Debouncer;
use core_async::runtime;
use core_async::sync::{mpsc, CancellationToken};
use core_async::task::{self, JoinHandle};
use core_runtime::config::SessionConfig;
use core_runtime::events::{EventBus, EventSeverity, EventStream, LatestValueBus, ReplayStream};
use tracing::{debug, info, instrument, trace, warn};

use crate::backend::{
    AudioBackend, BackendKind, BackendSignal, FocusBackend, RouteBackend, SignalReceiver,
};
use crate::configuration::{
    ActivationOptions, ActivationRequest, AudioSessionConfiguration, CategorySettings,
};
use crate::directory::DeviceDirectory;
use crate::error::{Result, SessionError};
use crate::events::{self, SessionEvent, SessionEventStream};
use crate::model::{DeviceSnapshot, DevicesChangedEvent, InterruptionEvent};

// ============================================================================
// Shared State
// ============================================================================

struct SessionInner {
    backend: Option<Arc<dyn AudioBackend>>,
    directory: DeviceDirectory,
    events: EventBus<SessionEvent>,
    configuration: LatestValueBus<AudioSessionConfiguration>,
    /// Taken on shutdown; dropping it abandons a pending refresh.
    debouncer: Mutex<Option<Debouncer>>,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    shut_down: AtomicBool,
}

impl SessionInner {
    fn backend_kind(&self) -> Option<BackendKind> {
        self.backend.as_ref().map(|backend| backend.kind())
    }

    fn dispatch(self: &Arc<Self>, signal: BackendSignal) {
        match signal {
            BackendSignal::Interruption(event) => self.emit(SessionEvent::Interruption(event)),
            BackendSignal::BecomingNoisy => self.emit(SessionEvent::BecomingNoisy),
            BackendSignal::DevicesChanged(changed) => {
                if !changed.is_empty() {
                    self.emit(SessionEvent::DevicesChanged(changed));
                }
                self.schedule_refresh();
            }
            BackendSignal::RouteChanged(reason) => {
                trace!(?reason, "Route change, scheduling refresh");
                self.schedule_refresh();
            }
        }
    }

    fn emit(&self, event: SessionEvent) {
        let description = event.description();
        match event.severity() {
            EventSeverity::Debug => debug!(event = description, "Publishing session event"),
            _ => info!(event = description, "Publishing session event"),
        }
        if self.events.emit(event).is_err() {
            trace!("No subscribers for session event");
        }
    }

    fn schedule_refresh(self: &Arc<Self>) {
        let debouncer = lock(&self.debouncer);
        let Some(debouncer) = debouncer.as_ref() else {
            return;
        };

        let session = Arc::downgrade(self);
        debouncer.schedule(move || async move {
            let Some(inner) = session.upgrade() else {
                return;
            };
            if let Err(err) = inner.refresh_all_devices().await {
                warn!(error = %err, "Device refresh failed");
            }
        });
    }

    /// Queries every device and reconciles the result into the directory.
    async fn refresh_all_devices(&self) -> Result<bool> {
        let Some(backend) = &self.backend else {
            return Ok(false);
        };

        let snapshot = backend.query_devices(true, true).await?;
        Ok(self.directory.reconcile(snapshot))
    }

    async fn apply_category(self: &Arc<Self>, settings: CategorySettings) -> bool {
        let Some(backend) = &self.backend else {
            return false;
        };
        if self.shut_down.load(Ordering::SeqCst) {
            debug!("Ignoring category change after shutdown");
            return false;
        }

        match backend.apply_category(&settings).await {
            Ok(true) => {
                self.schedule_refresh();
                true
            }
            Ok(false) => false,
            Err(err) => {
                warn!(error = %err, category = ?settings.category, "Failed to apply category");
                false
            }
        }
    }

    fn ensure_running(&self) -> Result<()> {
        if self.shut_down.load(Ordering::SeqCst) {
            Err(SessionError::ShutDown)
        } else {
            Ok(())
        }
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Forwards backend signals to the session until cancelled or the session is
/// dropped.
async fn pump(session: Weak<SessionInner>, mut signals: SignalReceiver, cancel: CancellationToken) {
    loop {
        let signal = tokio::select! {
            _ = cancel.cancelled() => break,
            signal = signals.recv() => signal,
        };

        let Some(signal) = signal else {
            break;
        };
        let Some(inner) = session.upgrade() else {
            break;
        };
        inner.dispatch(signal);
    }

    trace!("Notification pump stopped");
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Public API
// ============================================================================

/// Cross-platform audio session.
///
/// One instance per process; share it by reference. Dropping it stops the
/// background tasks, [`shutdown`](Self::shutdown) does the same and waits for
/// them.
pub struct AudioSession {
    inner: Arc<SessionInner>,
}

impl AudioSession {
    /// Starts a session for the bridge configured in `config`.
    ///
    /// # Errors
    ///
    /// - `SessionError::Runtime` if `config` is invalid or no Tokio runtime is
    ///   driving the caller
    /// - `SessionError::SubscriptionFailed` if the backend cannot subscribe to
    ///   native notifications
    pub async fn init(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        if runtime::current_handle().is_none() {
            return Err(core_runtime::Error::capability_missing(
                "async runtime",
                "AudioSession::init must be called from within a Tokio runtime",
            )
            .into());
        }

        let (signals, receiver) = mpsc::unbounded_channel();
        let backend: Option<Arc<dyn AudioBackend>> =
            match (config.route_bridge, config.focus_bridge) {
                (Some(bridge), _) => Some(Arc::new(RouteBackend::new(bridge, signals))),
                (None, Some(bridge)) => Some(Arc::new(FocusBackend::new(bridge, signals))),
                (None, None) => None,
            };

        let cancel = CancellationToken::new();
        let mut tasks = Vec::new();
        if let Some(backend) = &backend {
            tasks.push(backend.start(cancel.child_token()).await?);
        }

        let inner = Arc::new(SessionInner {
            backend,
            directory: DeviceDirectory::new(config.event_buffer_size),
            events: EventBus::new(config.event_buffer_size),
            configuration: LatestValueBus::new(config.event_buffer_size),
            debouncer: Mutex::new(Some(Debouncer::new(config.debounce_window))),
            cancel,
            tasks: Mutex::new(Vec::new()),
            shut_down: AtomicBool::new(false),
        });

        if inner.backend.is_some() {
            tasks.push(task::spawn(pump(
                Arc::downgrade(&inner),
                receiver,
                inner.cancel.child_token(),
            )));
        }
        *lock(&inner.tasks) = tasks;

        if let Err(err) = inner.refresh_all_devices().await {
            warn!(error = %err, "Initial device refresh failed");
        }

        info!(
            backend = ?inner.backend_kind(),
            debounce_ms = config.debounce_window.as_millis() as u64,
            "Audio session started"
        );

        Ok(Self { inner })
    }

    /// Returns the selected backend, `None` when running without one.
    pub fn backend_kind(&self) -> Option<BackendKind> {
        self.inner.backend_kind()
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::SeqCst)
    }

    // ------------------------------------------------------------------------
    // Queries and commands
    // ------------------------------------------------------------------------

    /// Queries the devices for the requested directions.
    ///
    /// A query for both directions is also reconciled into the directory, so
    /// `devices()` subscribers see the result if it differs.
    #[instrument(skip(self), fields(backend = ?self.backend_kind()))]
    pub async fn get_devices(
        &self,
        include_inputs: bool,
        include_outputs: bool,
    ) -> Result<DeviceSnapshot> {
        self.inner.ensure_running()?;
        let Some(backend) = &self.inner.backend else {
            return Ok(DeviceSnapshot::default());
        };

        let snapshot = backend.query_devices(include_inputs, include_outputs).await?;
        if include_inputs && include_outputs {
            self.inner.directory.reconcile(snapshot.clone());
        }

        debug!(device_count = snapshot.len(), "Queried devices");
        Ok(snapshot)
    }

    /// Activates or deactivates audio.
    ///
    /// `options` override the current configuration for this call. Returns
    /// `false` if the native request failed or was denied.
    #[instrument(skip(self, options), fields(backend = ?self.backend_kind()))]
    pub async fn set_active(&self, active: bool, options: ActivationOptions) -> bool {
        let Some(backend) = &self.inner.backend else {
            return true;
        };
        if self.is_shut_down() {
            debug!("Ignoring activation change after shutdown");
            return false;
        }

        let configuration = self.inner.configuration.latest().unwrap_or_default();
        let request = ActivationRequest::resolve(&configuration, &options);
        let applied = backend.set_active(active, &request).await;

        if applied {
            info!(active, "Audio session activation changed");
        }
        applied
    }

    /// Applies a session category if it differs from the effective one.
    ///
    /// Returns `true` if a change was applied. Failures are logged, never
    /// returned. Backends without categories always return `false`.
    #[instrument(skip(self), fields(backend = ?self.backend_kind()))]
    pub async fn set_category(
        &self,
        category: SessionCategory,
        options: CategoryOptions,
        mode: SessionMode,
        policy: RouteSharingPolicy,
    ) -> bool {
        self.inner
            .apply_category(CategorySettings {
                category,
                options,
                mode,
                policy,
            })
            .await
    }

    #[instrument(skip(self), fields(backend = ?self.backend_kind()))]
    pub async fn is_in_call(&self) -> Result<bool> {
        self.inner.ensure_running()?;
        match &self.inner.backend {
            Some(backend) => backend.is_in_call().await,
            None => Ok(false),
        }
    }

    /// Replaces the session configuration and applies its category.
    ///
    /// Returns `true` if the category had to be changed.
    #[instrument(skip(self, configuration), fields(backend = ?self.backend_kind()))]
    pub async fn configure(&self, configuration: AudioSessionConfiguration) -> bool {
        self.inner.configuration.publish(configuration);

        match configuration.category_settings() {
            Some(settings) => self.inner.apply_category(settings).await,
            None => false,
        }
    }

    /// The configuration last passed to [`configure`](Self::configure).
    pub fn configuration(&self) -> Option<AudioSessionConfiguration> {
        self.inner.configuration.latest()
    }

    pub fn configuration_stream(&self) -> ReplayStream<AudioSessionConfiguration> {
        self.inner.configuration.subscribe()
    }

    // ------------------------------------------------------------------------
    // Event surface
    // ------------------------------------------------------------------------

    pub fn interruption_events(&self) -> SessionEventStream<InterruptionEvent> {
        SessionEventStream::new(&self.inner.events, events::interruption)
    }

    pub fn becoming_noisy_events(&self) -> SessionEventStream<()> {
        SessionEventStream::new(&self.inner.events, events::becoming_noisy)
    }

    pub fn devices_changed_events(&self) -> SessionEventStream<DevicesChangedEvent> {
        SessionEventStream::new(&self.inner.events, events::devices_changed)
    }

    /// Snapshot stream, starting with the current snapshot if one exists.
    pub fn devices(&self) -> ReplayStream<DeviceSnapshot> {
        self.inner.directory.subscribe()
    }

    pub fn current_devices(&self) -> Option<DeviceSnapshot> {
        self.inner.directory.current()
    }

    /// All session events.
    pub fn subscribe(&self) -> EventStream<SessionEvent> {
        EventStream::new(self.inner.events.subscribe())
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Stops the native listener, the pump and any pending refresh, then waits
    /// for the background tasks. Calling it again is a no-op.
    ///
    /// Focus is not abandoned; call `set_active(false, ..)` first if needed.
    #[instrument(skip(self), fields(backend = ?self.backend_kind()))]
    pub async fn shutdown(&self) -> Result<()> {
        if self.inner.shut_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.inner.cancel.cancel();
        drop(lock(&self.inner.debouncer).take());

        let tasks = std::mem::take(&mut *lock(&self.inner.tasks));
        for result in futures::future::join_all(tasks).await {
            if let Err(err) = result {
                if err.is_panic() {
                    return Err(core_runtime::Error::Internal(format!(
                        "session task panicked: {}",
                        err
                    ))
                    .into());
                }
            }
        }

        info!("Audio session shut down");
        Ok(())
    }
}

impl std::fmt::Debug for AudioSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioSession")
            .field("backend", &self.backend_kind())
            .field("shut_down", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}
