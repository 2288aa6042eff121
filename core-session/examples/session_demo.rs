//! Runs a session against a scripted focus host and prints what it reports.
//!
//! ```text
//! cargo run -p core-session --example session_demo
//! ```

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::focus::{
    AudioMode, DeviceFlags, FocusChange, FocusChangeCallback, FocusDeviceBridge,
    FocusNotification, FocusNotificationStream, FocusRequest, NativeDeviceInfo, NativeDeviceType,
};
use bridge_traits::logging::LogLevel;
use core_runtime::config::SessionConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_session::{ActivationOptions, AudioSession, AudioSessionConfiguration};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

struct ScriptedHost {
    devices: Mutex<Vec<NativeDeviceInfo>>,
    callback: Mutex<Option<FocusChangeCallback>>,
    notifications: Mutex<Option<mpsc::UnboundedReceiver<FocusNotification>>>,
}

struct HostStream(mpsc::UnboundedReceiver<FocusNotification>);

#[async_trait]
impl FocusNotificationStream for HostStream {
    async fn next(&mut self) -> Option<FocusNotification> {
        self.0.recv().await
    }
}

#[async_trait]
impl FocusDeviceBridge for ScriptedHost {
    async fn devices(&self, _flags: DeviceFlags) -> BridgeResult<Vec<NativeDeviceInfo>> {
        Ok(self.devices.lock().unwrap().clone())
    }

    async fn request_focus(
        &self,
        _request: FocusRequest,
        callback: FocusChangeCallback,
    ) -> BridgeResult<bool> {
        *self.callback.lock().unwrap() = Some(callback);
        Ok(true)
    }

    async fn abandon_focus(&self) -> BridgeResult<bool> {
        Ok(true)
    }

    async fn mode(&self) -> BridgeResult<AudioMode> {
        Ok(AudioMode::Normal)
    }

    async fn subscribe(&self) -> BridgeResult<Box<dyn FocusNotificationStream>> {
        let receiver = self
            .notifications
            .lock()
            .unwrap()
            .take()
            .ok_or(bridge_traits::BridgeError::SubscriptionClosed)?;
        Ok(Box::new(HostStream(receiver)))
    }
}

fn device(id: i32, name: &str, device_type: NativeDeviceType) -> NativeDeviceInfo {
    NativeDeviceInfo {
        id,
        product_name: name.to_string(),
        is_source: false,
        is_sink: true,
        device_type,
        address: String::new(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug),
    )?;

    let (sender, receiver) = mpsc::unbounded_channel();
    let host = Arc::new(ScriptedHost {
        devices: Mutex::new(vec![device(2, "Speaker", NativeDeviceType::BUILTIN_SPEAKER)]),
        callback: Mutex::new(None),
        notifications: Mutex::new(Some(receiver)),
    });

    let session = AudioSession::init(SessionConfig::builder().focus_bridge(host.clone()).build()?).await?;
    session.configure(AudioSessionConfiguration::music()).await;

    let mut snapshots = session.devices();
    let mut interruptions = session.interruption_events();
    println!("initial devices: {:?}", snapshots.recv().await?.into_vec());

    // Headphones plugged in.
    let headphones = device(4, "Headphones", NativeDeviceType::WIRED_HEADPHONES);
    host.devices.lock().unwrap().push(headphones.clone());
    sender.send(FocusNotification::DevicesAdded(vec![headphones]))?;
    println!("after plug-in: {:?}", snapshots.recv().await?.into_vec());

    // Another app ducks us, then gives focus back.
    session
        .set_active(true, ActivationOptions::default().with_pause_when_ducked(false))
        .await;
    if let Some(callback) = host.callback.lock().unwrap().clone() {
        callback(FocusChange::LossTransientCanDuck);
        callback(FocusChange::Gain);
    }
    for _ in 0..2 {
        println!("interruption: {:?}", interruptions.recv().await?);
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    session.set_active(false, ActivationOptions::default()).await;
    session.shutdown().await?;
    Ok(())
}
