//! End-to-end tests for the audio session coordinator.
//!
//! Both backends are driven through in-memory bridges that push native
//! notifications over channels, the way a host adapter would.

use bridge_traits::error::Result as BridgeResult;
use bridge_traits::focus::{
    AudioMode, DeviceFlags, FocusChange, FocusChangeCallback, FocusDeviceBridge,
    FocusNotification, FocusNotificationStream, FocusRequest, NativeDeviceInfo, NativeDeviceType,
};
use bridge_traits::route::{
    AudioRoute, CategoryOptions, InterruptionNotification, InterruptionOptions, PortType,
    RouteChangeReason, RouteNotification, RouteNotificationStream, RoutePort, RouteSessionBridge,
    RouteSharingPolicy, SessionCategory, SessionMode, SetActiveOptions,
};
use bridge_traits::BridgeError;
use core_runtime::config::SessionConfig;
use core_session::{
    ActivationOptions, AudioSession, AudioSessionConfiguration, BackendKind, DeviceType,
    InterruptionEvent, InterruptionType, SessionError,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

// ============================================================================
// Notification Channel
// ============================================================================

struct ChannelStream<T> {
    receiver: mpsc::UnboundedReceiver<T>,
}

#[async_trait::async_trait]
impl RouteNotificationStream for ChannelStream<RouteNotification> {
    async fn next(&mut self) -> Option<RouteNotification> {
        self.receiver.recv().await
    }
}

#[async_trait::async_trait]
impl FocusNotificationStream for ChannelStream<FocusNotification> {
    async fn next(&mut self) -> Option<FocusNotification> {
        self.receiver.recv().await
    }
}

fn channel<T>() -> (mpsc::UnboundedSender<T>, Mutex<Option<ChannelStream<T>>>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (sender, Mutex::new(Some(ChannelStream { receiver })))
}

// ============================================================================
// Route Session Bridge
// ============================================================================

struct FakeRouteBridge {
    route: Mutex<AudioRoute>,
    available: Mutex<Vec<RoutePort>>,
    settings: Mutex<(SessionCategory, CategoryOptions, SessionMode, RouteSharingPolicy)>,
    set_category_calls: AtomicUsize,
    active: Mutex<Vec<bool>>,
    /// Makes session and category calls fail the way a rejecting host would.
    failing: AtomicBool,
    stream: Mutex<Option<ChannelStream<RouteNotification>>>,
}

impl FakeRouteBridge {
    fn new(route: AudioRoute) -> (Arc<Self>, mpsc::UnboundedSender<RouteNotification>) {
        let (sender, stream) = channel();
        let available = route.inputs.clone();
        let bridge = Arc::new(Self {
            route: Mutex::new(route),
            available: Mutex::new(available),
            settings: Mutex::new((
                SessionCategory::SoloAmbient,
                CategoryOptions::NONE,
                SessionMode::Default,
                RouteSharingPolicy::Default,
            )),
            set_category_calls: AtomicUsize::new(0),
            active: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            stream,
        });
        (bridge, sender)
    }

    fn check(&self) -> BridgeResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BridgeError::Rejected {
                code: -50,
                message: "session is busy".to_string(),
            });
        }
        Ok(())
    }

    fn set_route(&self, route: AudioRoute) {
        *self.available.lock().unwrap() = route.inputs.clone();
        *self.route.lock().unwrap() = route;
    }
}

#[async_trait::async_trait]
impl RouteSessionBridge for FakeRouteBridge {
    async fn current_route(&self) -> BridgeResult<AudioRoute> {
        Ok(self.route.lock().unwrap().clone())
    }

    async fn available_inputs(&self) -> BridgeResult<Vec<RoutePort>> {
        Ok(self.available.lock().unwrap().clone())
    }

    async fn category(&self) -> BridgeResult<SessionCategory> {
        self.check()?;
        Ok(self.settings.lock().unwrap().0)
    }

    async fn category_options(&self) -> BridgeResult<CategoryOptions> {
        Ok(self.settings.lock().unwrap().1)
    }

    async fn mode(&self) -> BridgeResult<SessionMode> {
        Ok(self.settings.lock().unwrap().2)
    }

    async fn route_sharing_policy(&self) -> BridgeResult<RouteSharingPolicy> {
        Ok(self.settings.lock().unwrap().3)
    }

    async fn set_category(
        &self,
        category: SessionCategory,
        options: CategoryOptions,
        mode: SessionMode,
        policy: RouteSharingPolicy,
    ) -> BridgeResult<()> {
        self.set_category_calls.fetch_add(1, Ordering::SeqCst);
        *self.settings.lock().unwrap() = (category, options, mode, policy);
        Ok(())
    }

    async fn set_active(&self, active: bool, _options: SetActiveOptions) -> BridgeResult<()> {
        self.check()?;
        self.active.lock().unwrap().push(active);
        Ok(())
    }

    async fn is_in_call(&self) -> BridgeResult<bool> {
        Ok(false)
    }

    async fn subscribe(&self) -> BridgeResult<Box<dyn RouteNotificationStream>> {
        match self.stream.lock().unwrap().take() {
            Some(stream) => Ok(Box::new(stream)),
            None => Err(BridgeError::SubscriptionClosed),
        }
    }
}

fn port(uid: &str, port_type: PortType) -> RoutePort {
    RoutePort::new(uid, format!("{} port", uid), port_type)
}

fn speaker_route() -> AudioRoute {
    AudioRoute::new(
        vec![port("mic", PortType::BuiltInMic)],
        vec![port("speaker", PortType::BuiltInSpeaker)],
    )
}

fn headset_route() -> AudioRoute {
    AudioRoute::new(
        vec![port("headset-mic", PortType::HeadsetMic)],
        vec![port("headset", PortType::Headphones)],
    )
}

// ============================================================================
// Focus Device Bridge
// ============================================================================

struct FakeFocusBridge {
    devices: Mutex<Vec<NativeDeviceInfo>>,
    device_queries: AtomicUsize,
    callback: Mutex<Option<FocusChangeCallback>>,
    grant: Mutex<bool>,
    mode: Mutex<AudioMode>,
    stream: Mutex<Option<ChannelStream<FocusNotification>>>,
}

impl FakeFocusBridge {
    fn new(devices: Vec<NativeDeviceInfo>) -> (Arc<Self>, mpsc::UnboundedSender<FocusNotification>) {
        let (sender, stream) = channel();
        let bridge = Arc::new(Self {
            devices: Mutex::new(devices),
            device_queries: AtomicUsize::new(0),
            callback: Mutex::new(None),
            grant: Mutex::new(true),
            mode: Mutex::new(AudioMode::Normal),
            stream,
        });
        (bridge, sender)
    }

    fn callback(&self) -> FocusChangeCallback {
        self.callback
            .lock()
            .unwrap()
            .clone()
            .expect("focus was never requested")
    }

    fn queries(&self) -> usize {
        self.device_queries.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl FocusDeviceBridge for FakeFocusBridge {
    async fn devices(&self, flags: DeviceFlags) -> BridgeResult<Vec<NativeDeviceInfo>> {
        self.device_queries.fetch_add(1, Ordering::SeqCst);
        let devices = self.devices.lock().unwrap();
        Ok(devices
            .iter()
            .filter(|device| match flags {
                DeviceFlags::Inputs => device.is_source,
                DeviceFlags::Outputs => device.is_sink,
                DeviceFlags::All => true,
            })
            .cloned()
            .collect())
    }

    async fn request_focus(
        &self,
        _request: FocusRequest,
        callback: FocusChangeCallback,
    ) -> BridgeResult<bool> {
        *self.callback.lock().unwrap() = Some(callback);
        Ok(*self.grant.lock().unwrap())
    }

    async fn abandon_focus(&self) -> BridgeResult<bool> {
        Ok(true)
    }

    async fn mode(&self) -> BridgeResult<AudioMode> {
        Ok(*self.mode.lock().unwrap())
    }

    async fn subscribe(&self) -> BridgeResult<Box<dyn FocusNotificationStream>> {
        match self.stream.lock().unwrap().take() {
            Some(stream) => Ok(Box::new(stream)),
            None => Err(BridgeError::SubscriptionClosed),
        }
    }
}

fn native(id: i32, device_type: NativeDeviceType) -> NativeDeviceInfo {
    NativeDeviceInfo {
        id,
        product_name: format!("Device {}", id),
        is_source: device_type == NativeDeviceType::BUILTIN_MIC,
        is_sink: device_type != NativeDeviceType::BUILTIN_MIC,
        device_type,
        address: String::new(),
    }
}

async fn focus_session(bridge: &Arc<FakeFocusBridge>) -> AudioSession {
    let config = SessionConfig::builder()
        .focus_bridge(bridge.clone())
        .debounce_window(Duration::from_millis(100))
        .build()
        .unwrap();
    AudioSession::init(config).await.unwrap()
}

async fn route_session(bridge: &Arc<FakeRouteBridge>) -> AudioSession {
    let config = SessionConfig::builder()
        .route_bridge(bridge.clone())
        .build()
        .unwrap();
    AudioSession::init(config).await.unwrap()
}

// ============================================================================
// Device Reconciliation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_device_burst_settles_into_one_snapshot() {
    let (bridge, notifications) = FakeFocusBridge::new(vec![
        native(2, NativeDeviceType::BUILTIN_SPEAKER),
        native(4, NativeDeviceType::WIRED_HEADPHONES),
    ]);
    let session = focus_session(&bridge).await;
    assert_eq!(session.backend_kind(), Some(BackendKind::Focus));
    assert_eq!(bridge.queries(), 1);

    let mut snapshots = session.devices();
    let initial = snapshots.recv().await.unwrap();
    assert_eq!(initial.len(), 2);

    let usb = native(11, NativeDeviceType::USB_DEVICE);
    let headphones = native(4, NativeDeviceType::WIRED_HEADPHONES);

    bridge.devices.lock().unwrap().push(usb.clone());
    notifications
        .send(FocusNotification::DevicesAdded(vec![usb]))
        .unwrap();
    sleep(Duration::from_millis(30)).await;

    bridge.devices.lock().unwrap().retain(|device| device.id != 4);
    notifications
        .send(FocusNotification::DevicesRemoved(vec![headphones]))
        .unwrap();

    sleep(Duration::from_millis(50)).await;
    assert!(snapshots.try_recv().is_none());
    assert_eq!(bridge.queries(), 1);

    sleep(Duration::from_millis(200)).await;
    let settled = snapshots.recv().await.unwrap();
    let ids: Vec<_> = settled.iter().map(|device| device.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "11"]);
    assert_eq!(settled.get("11").unwrap().device_type, DeviceType::UsbAudio);

    assert!(snapshots.try_recv().is_none());
    assert_eq!(bridge.queries(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_device_deltas_are_published_immediately() {
    let (bridge, notifications) = FakeFocusBridge::new(vec![native(
        2,
        NativeDeviceType::BUILTIN_SPEAKER,
    )]);
    let session = focus_session(&bridge).await;
    let mut changes = session.devices_changed_events();

    notifications
        .send(FocusNotification::DevicesAdded(vec![native(
            8,
            NativeDeviceType::BLUETOOTH_A2DP,
        )]))
        .unwrap();

    let changed = changes.recv().await.unwrap();
    assert_eq!(changed.added.len(), 1);
    assert_eq!(changed.added[0].device_type, DeviceType::BluetoothA2dp);
    assert!(changed.removed.is_empty());
}

#[tokio::test]
async fn test_get_devices_reconciles_full_queries_only() {
    let (bridge, _notifications) = FakeFocusBridge::new(vec![
        native(2, NativeDeviceType::BUILTIN_SPEAKER),
        native(15, NativeDeviceType::BUILTIN_MIC),
    ]);
    let session = focus_session(&bridge).await;
    let mut snapshots = session.devices();
    snapshots.recv().await.unwrap();

    bridge
        .devices
        .lock()
        .unwrap()
        .push(native(9, NativeDeviceType::HDMI));

    let outputs = session.get_devices(false, true).await.unwrap();
    assert_eq!(outputs.len(), 2);
    assert!(snapshots.try_recv().is_none());

    let all = session.get_devices(true, true).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(snapshots.recv().await.unwrap(), all);
    assert_eq!(session.current_devices(), Some(all));
}

// ============================================================================
// Interruptions
// ============================================================================

#[tokio::test]
async fn test_focus_duck_cycle_through_session() {
    let (bridge, _notifications) = FakeFocusBridge::new(Vec::new());
    let session = focus_session(&bridge).await;
    let mut interruptions = session.interruption_events();

    let options = ActivationOptions::default().with_pause_when_ducked(false);
    assert!(session.set_active(true, options).await);

    let callback = bridge.callback();
    callback(FocusChange::LossTransientCanDuck);
    callback(FocusChange::Gain);

    assert_eq!(
        interruptions.recv().await.unwrap(),
        InterruptionEvent::began(InterruptionType::Duck)
    );
    assert_eq!(
        interruptions.recv().await.unwrap(),
        InterruptionEvent::ended(InterruptionType::Duck)
    );
}

#[tokio::test]
async fn test_configured_pause_when_ducked() {
    let (bridge, _notifications) = FakeFocusBridge::new(Vec::new());
    let session = focus_session(&bridge).await;
    let mut interruptions = session.interruption_events();

    session.configure(AudioSessionConfiguration::speech()).await;
    assert!(session.set_active(true, ActivationOptions::default()).await);

    let callback = bridge.callback();
    callback(FocusChange::LossTransientCanDuck);
    callback(FocusChange::Gain);

    assert_eq!(
        interruptions.recv().await.unwrap(),
        InterruptionEvent::began(InterruptionType::Pause)
    );
    assert_eq!(
        interruptions.recv().await.unwrap(),
        InterruptionEvent::ended(InterruptionType::Pause)
    );
}

#[tokio::test]
async fn test_stale_focus_callback_is_ignored() {
    let (bridge, _notifications) = FakeFocusBridge::new(Vec::new());
    let session = focus_session(&bridge).await;
    let mut interruptions = session.interruption_events();

    assert!(session.set_active(true, ActivationOptions::default()).await);
    let stale = bridge.callback();
    assert!(session.set_active(false, ActivationOptions::default()).await);

    stale(FocusChange::LossTransient);
    assert!(timeout(Duration::from_millis(50), interruptions.recv())
        .await
        .is_err());
}

#[tokio::test]
async fn test_denied_focus_reports_false() {
    let (bridge, _notifications) = FakeFocusBridge::new(Vec::new());
    *bridge.grant.lock().unwrap() = false;
    let session = focus_session(&bridge).await;

    assert!(!session.set_active(true, ActivationOptions::default()).await);
}

#[tokio::test]
async fn test_route_interruption_through_session() {
    let (bridge, notifications) = FakeRouteBridge::new(speaker_route());
    let session = route_session(&bridge).await;
    let mut interruptions = session.interruption_events();

    notifications
        .send(RouteNotification::Interruption(
            InterruptionNotification::Began {
                was_suspended: Some(true),
            },
        ))
        .unwrap();
    notifications
        .send(RouteNotification::Interruption(
            InterruptionNotification::Ended {
                options: InterruptionOptions {
                    should_resume: true,
                },
            },
        ))
        .unwrap();

    // The suspended begin is dropped; the end still arrives.
    assert_eq!(
        interruptions.recv().await.unwrap(),
        InterruptionEvent::ended(InterruptionType::Pause)
    );
}

// ============================================================================
// Route Changes
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_unplug_raises_becoming_noisy() {
    let (bridge, notifications) = FakeRouteBridge::new(headset_route());
    let session = route_session(&bridge).await;
    assert_eq!(session.backend_kind(), Some(BackendKind::Route));

    let initial = session.current_devices().unwrap();
    assert_eq!(
        initial.get("headset").unwrap().device_type,
        DeviceType::WiredHeadset
    );

    let mut noisy = session.becoming_noisy_events();
    let mut changes = session.devices_changed_events();

    bridge.set_route(speaker_route());
    notifications
        .send(RouteNotification::RouteChange {
            reason: RouteChangeReason::OldDeviceUnavailable,
        })
        .unwrap();

    noisy.recv().await.unwrap();
    let changed = changes.recv().await.unwrap();
    let removed: Vec<_> = changed.removed.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(removed, vec!["headset-mic", "headset"]);
    assert!(changed.added.is_empty());

    sleep(Duration::from_millis(150)).await;
    let settled = session.current_devices().unwrap();
    assert!(settled.contains("speaker"));
    assert!(!settled.contains("headset"));
}

#[tokio::test]
async fn test_set_category_applies_once() {
    let (bridge, _notifications) = FakeRouteBridge::new(speaker_route());
    let session = route_session(&bridge).await;

    let apply = || {
        session.set_category(
            SessionCategory::PlayAndRecord,
            CategoryOptions::ALLOW_BLUETOOTH,
            SessionMode::VoiceChat,
            RouteSharingPolicy::Default,
        )
    };

    assert!(apply().await);
    assert!(!apply().await);
    assert_eq!(bridge.set_category_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_configure_applies_category() {
    let (bridge, _notifications) = FakeRouteBridge::new(speaker_route());
    let session = route_session(&bridge).await;

    assert!(session.configure(AudioSessionConfiguration::music()).await);
    assert_eq!(bridge.settings.lock().unwrap().0, SessionCategory::Playback);
    assert_eq!(
        session.configuration(),
        Some(AudioSessionConfiguration::music())
    );

    assert!(session.set_active(true, ActivationOptions::default()).await);
    assert_eq!(*bridge.active.lock().unwrap(), vec![true]);
}

#[tokio::test]
async fn test_native_session_failures_report_false() {
    let (bridge, _notifications) = FakeRouteBridge::new(speaker_route());
    let session = route_session(&bridge).await;
    bridge.failing.store(true, Ordering::SeqCst);

    assert!(
        !session
            .set_category(
                SessionCategory::Playback,
                CategoryOptions::NONE,
                SessionMode::Default,
                RouteSharingPolicy::Default,
            )
            .await
    );
    assert!(!session.configure(AudioSessionConfiguration::music()).await);
    assert!(!session.set_active(true, ActivationOptions::default()).await);
    assert_eq!(bridge.set_category_calls.load(Ordering::SeqCst), 0);
    assert!(bridge.active.lock().unwrap().is_empty());

    // The configuration is kept even though the host refused it.
    assert_eq!(
        session.configuration(),
        Some(AudioSessionConfiguration::music())
    );
}

#[tokio::test]
async fn test_oversized_event_buffer_is_rejected() {
    let (bridge, _notifications) = FakeRouteBridge::new(speaker_route());
    let config = SessionConfig {
        route_bridge: Some(bridge as Arc<dyn RouteSessionBridge>),
        event_buffer_size: usize::MAX,
        ..SessionConfig::default()
    };

    assert!(matches!(
        AudioSession::init(config).await,
        Err(SessionError::Runtime(core_runtime::Error::Config(_)))
    ));
}

// ============================================================================
// Calls and Lifecycle
// ============================================================================

#[tokio::test]
async fn test_is_in_call_follows_focus_mode() {
    let (bridge, _notifications) = FakeFocusBridge::new(Vec::new());
    let session = focus_session(&bridge).await;

    assert!(!session.is_in_call().await.unwrap());
    *bridge.mode.lock().unwrap() = AudioMode::InCommunication;
    assert!(session.is_in_call().await.unwrap());
}

#[tokio::test]
async fn test_both_bridges_are_rejected() {
    let (route, _route_notifications) = FakeRouteBridge::new(speaker_route());
    let (focus, _focus_notifications) = FakeFocusBridge::new(Vec::new());

    let config = SessionConfig {
        route_bridge: Some(route as Arc<dyn RouteSessionBridge>),
        focus_bridge: Some(focus as Arc<dyn FocusDeviceBridge>),
        ..SessionConfig::default()
    };

    assert!(matches!(
        AudioSession::init(config).await,
        Err(SessionError::Runtime(core_runtime::Error::Config(_)))
    ));
}

#[tokio::test]
async fn test_subscription_failure_fails_init() {
    let (bridge, _notifications) = FakeFocusBridge::new(Vec::new());
    bridge.stream.lock().unwrap().take();

    let config = SessionConfig::builder()
        .focus_bridge(bridge.clone())
        .build()
        .unwrap();

    assert!(matches!(
        AudioSession::init(config).await,
        Err(SessionError::SubscriptionFailed {
            backend: BackendKind::Focus,
            ..
        })
    ));
}

#[tokio::test]
async fn test_shutdown_stops_listeners() {
    let (bridge, notifications) = FakeRouteBridge::new(speaker_route());
    let session = route_session(&bridge).await;

    session.shutdown().await.unwrap();

    assert!(session.is_shut_down());
    assert!(notifications.is_closed());
    assert!(matches!(
        session.get_devices(true, true).await,
        Err(SessionError::ShutDown)
    ));
    assert!(!session.set_active(true, ActivationOptions::default()).await);
}
