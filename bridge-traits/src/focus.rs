//! Focus/device bridge (focus-based audio model).
//!
//! There is no process-wide session on this model. Apps *request audio focus*
//! with a gain type and receive focus-change callbacks until they abandon it.
//! Devices are enumerated directly and reported with integer type codes.
//! Device hot-plug and the "becoming noisy" broadcast arrive as notifications.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    platform::{PlatformSend, PlatformSendSync},
};

/// Integer device type code as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NativeDeviceType(pub i32);

impl NativeDeviceType {
    pub const UNKNOWN: Self = Self(0);
    pub const BUILTIN_EARPIECE: Self = Self(1);
    pub const BUILTIN_SPEAKER: Self = Self(2);
    pub const WIRED_HEADSET: Self = Self(3);
    pub const WIRED_HEADPHONES: Self = Self(4);
    pub const LINE_ANALOG: Self = Self(5);
    pub const LINE_DIGITAL: Self = Self(6);
    pub const BLUETOOTH_SCO: Self = Self(7);
    pub const BLUETOOTH_A2DP: Self = Self(8);
    pub const HDMI: Self = Self(9);
    pub const HDMI_ARC: Self = Self(10);
    pub const USB_DEVICE: Self = Self(11);
    pub const USB_ACCESSORY: Self = Self(12);
    pub const DOCK: Self = Self(13);
    pub const FM: Self = Self(14);
    pub const BUILTIN_MIC: Self = Self(15);
    pub const FM_TUNER: Self = Self(16);
    pub const TV_TUNER: Self = Self(17);
    pub const TELEPHONY: Self = Self(18);
    pub const AUX_LINE: Self = Self(19);
    pub const IP: Self = Self(20);
    pub const BUS: Self = Self(21);
    pub const USB_HEADSET: Self = Self(22);
    pub const HEARING_AID: Self = Self(23);
    pub const BUILTIN_SPEAKER_SAFE: Self = Self(24);
    pub const REMOTE_SUBMIX: Self = Self(25);
    pub const BLE_HEADSET: Self = Self(26);
    pub const BLE_SPEAKER: Self = Self(27);
    pub const ECHO_REFERENCE: Self = Self(28);
    pub const HDMI_EARC: Self = Self(29);
    pub const BLE_BROADCAST: Self = Self(30);
    pub const DOCK_ANALOG: Self = Self(31);

    pub const fn raw(self) -> i32 {
        self.0
    }
}

/// Device description as reported by the host enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeDeviceInfo {
    pub id: i32,
    pub product_name: String,
    pub is_source: bool,
    pub is_sink: bool,
    pub device_type: NativeDeviceType,
    /// Hardware address (e.g. a Bluetooth MAC). Empty when unavailable.
    pub address: String,
}

/// Which device directions an enumeration returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceFlags {
    Inputs,
    Outputs,
    All,
}

impl DeviceFlags {
    /// Builds the flag for the requested directions, `None` if neither is wanted.
    pub fn from_directions(inputs: bool, outputs: bool) -> Option<Self> {
        match (inputs, outputs) {
            (true, true) => Some(Self::All),
            (true, false) => Some(Self::Inputs),
            (false, true) => Some(Self::Outputs),
            (false, false) => None,
        }
    }

    /// Host SDK's raw flag value.
    pub const fn bits(self) -> i32 {
        match self {
            Self::Inputs => 1,
            Self::Outputs => 2,
            Self::All => 3,
        }
    }
}

/// Focus change delivered to the focus holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FocusChange {
    Gain,
    Loss,
    LossTransient,
    LossTransientCanDuck,
}

impl FocusChange {
    /// Maps the host SDK's raw focus change code.
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            1 => Some(Self::Gain),
            -1 => Some(Self::Loss),
            -2 => Some(Self::LossTransient),
            -3 => Some(Self::LossTransientCanDuck),
            _ => None,
        }
    }
}

/// Kind of focus being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FocusGainType {
    #[default]
    Gain,
    GainTransient,
    GainTransientMayDuck,
    GainTransientExclusive,
}

/// Content type of the audio the app plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ContentType {
    #[default]
    Unknown,
    Speech,
    Music,
    Movie,
    Sonification,
}

/// Usage of the audio the app plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AudioUsage {
    #[default]
    Unknown,
    Media,
    VoiceCommunication,
    VoiceCommunicationSignalling,
    Alarm,
    Notification,
    NotificationRingtone,
    AssistanceAccessibility,
    AssistanceNavigationGuidance,
    AssistanceSonification,
    Game,
    Assistant,
}

/// Attributes describing the audio stream a focus request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AudioAttributes {
    pub content_type: ContentType,
    /// Raw attribute flags, passed through to the host.
    pub flags: i32,
    pub usage: AudioUsage,
}

/// Focus request parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusRequest {
    pub gain_type: FocusGainType,
    pub attributes: Option<AudioAttributes>,
    /// Ask the host to deliver a transient loss instead of ducking automatically.
    pub will_pause_when_ducked: bool,
}

/// Callback receiving focus changes for an accepted request.
///
/// Hosts may invoke it from any thread.
pub type FocusChangeCallback = Arc<dyn Fn(FocusChange) + Send + Sync>;

/// Audio mode of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioMode {
    Normal,
    Ringtone,
    InCall,
    InCommunication,
    CallScreening,
    Other(i32),
}

impl AudioMode {
    /// Maps the host SDK's raw mode value.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Normal,
            1 => Self::Ringtone,
            2 => Self::InCall,
            3 => Self::InCommunication,
            4 => Self::CallScreening,
            other => Self::Other(other),
        }
    }

    /// Returns `true` for telephony and VoIP call modes.
    pub fn is_call(self) -> bool {
        matches!(self, Self::InCall | Self::InCommunication)
    }
}

/// Notification delivered by the focus/device host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusNotification {
    DevicesAdded(Vec<NativeDeviceInfo>),
    DevicesRemoved(Vec<NativeDeviceInfo>),
    /// Output is about to switch back to the built-in speaker.
    BecomingNoisy,
}

/// Focus/device bridge implemented by the host.
#[async_trait::async_trait]
pub trait FocusDeviceBridge: PlatformSendSync {
    /// Enumerates devices for the requested directions.
    async fn devices(&self, flags: DeviceFlags) -> Result<Vec<NativeDeviceInfo>>;

    /// Requests audio focus. Returns `true` if focus was granted.
    ///
    /// The callback stays registered until [`abandon_focus`](Self::abandon_focus).
    async fn request_focus(
        &self,
        request: FocusRequest,
        callback: FocusChangeCallback,
    ) -> Result<bool>;

    /// Abandons a previously requested focus. Returns `true` on success.
    async fn abandon_focus(&self) -> Result<bool>;

    async fn mode(&self) -> Result<AudioMode>;

    /// Subscribes to device hot-plug and becoming-noisy notifications.
    async fn subscribe(&self) -> Result<Box<dyn FocusNotificationStream>>;
}

/// Stream of focus host notifications.
#[async_trait::async_trait]
pub trait FocusNotificationStream: PlatformSend {
    /// Returns `None` when the stream is closed.
    async fn next(&mut self) -> Option<FocusNotification>;
}

impl fmt::Display for FocusChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gain => "gain",
            Self::Loss => "loss",
            Self::LossTransient => "loss_transient",
            Self::LossTransientCanDuck => "loss_transient_can_duck",
        };
        f.write_str(name)
    }
}
