//! Route/session bridge (linear audio-session model).
//!
//! The host exposes one process-wide audio session. Its state is a *category*,
//! a *mode*, a set of *category options* and a *route sharing policy*; the
//! hardware it currently plays through is the *route*, an ordered list of input
//! and output *ports*. The session reports interruptions and route changes as
//! notifications.
//!
//! Port types and raw values follow the host SDK's string constants so adapters
//! can pass them through untouched.

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    platform::{PlatformSend, PlatformSendSync},
};

/// Physical or virtual endpoint type of a route port.
///
/// Unrecognized native values are preserved in [`PortType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortType {
    BuiltInMic,
    HeadsetMic,
    LineIn,
    LineOut,
    Headphones,
    BluetoothA2dp,
    BluetoothHfp,
    BluetoothLe,
    BuiltInReceiver,
    BuiltInSpeaker,
    Hdmi,
    AirPlay,
    UsbAudio,
    CarAudio,
    Virtual,
    Pci,
    FireWire,
    DisplayPort,
    Avb,
    Thunderbolt,
    /// Port type string the bridge does not know about.
    Other(String),
}

impl PortType {
    /// Parses the host SDK's port type constant.
    pub fn from_native(raw: &str) -> Self {
        match raw {
            "MicrophoneBuiltIn" => Self::BuiltInMic,
            "MicrophoneWired" => Self::HeadsetMic,
            "LineIn" => Self::LineIn,
            "LineOut" => Self::LineOut,
            "Headphones" => Self::Headphones,
            "BluetoothA2DPOutput" => Self::BluetoothA2dp,
            "BluetoothHFP" => Self::BluetoothHfp,
            "BluetoothLE" => Self::BluetoothLe,
            "Receiver" => Self::BuiltInReceiver,
            "Speaker" => Self::BuiltInSpeaker,
            "HDMIOutput" => Self::Hdmi,
            "AirPlay" => Self::AirPlay,
            "USBAudio" => Self::UsbAudio,
            "CarAudio" => Self::CarAudio,
            "Virtual" => Self::Virtual,
            "PCI" => Self::Pci,
            "FireWire" => Self::FireWire,
            "DisplayPort" => Self::DisplayPort,
            "AVB" => Self::Avb,
            "Thunderbolt" => Self::Thunderbolt,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the host SDK's port type constant.
    pub fn as_native(&self) -> &str {
        match self {
            Self::BuiltInMic => "MicrophoneBuiltIn",
            Self::HeadsetMic => "MicrophoneWired",
            Self::LineIn => "LineIn",
            Self::LineOut => "LineOut",
            Self::Headphones => "Headphones",
            Self::BluetoothA2dp => "BluetoothA2DPOutput",
            Self::BluetoothHfp => "BluetoothHFP",
            Self::BluetoothLe => "BluetoothLE",
            Self::BuiltInReceiver => "Receiver",
            Self::BuiltInSpeaker => "Speaker",
            Self::Hdmi => "HDMIOutput",
            Self::AirPlay => "AirPlay",
            Self::UsbAudio => "USBAudio",
            Self::CarAudio => "CarAudio",
            Self::Virtual => "Virtual",
            Self::Pci => "PCI",
            Self::FireWire => "FireWire",
            Self::DisplayPort => "DisplayPort",
            Self::Avb => "AVB",
            Self::Thunderbolt => "Thunderbolt",
            Self::Other(raw) => raw,
        }
    }
}

/// Description of one route port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePort {
    /// System-assigned unique identifier of the port.
    pub uid: String,
    /// Human-readable port name (e.g. the Bluetooth device name).
    pub port_name: String,
    pub port_type: PortType,
}

impl RoutePort {
    pub fn new(uid: impl Into<String>, port_name: impl Into<String>, port_type: PortType) -> Self {
        Self {
            uid: uid.into(),
            port_name: port_name.into(),
            port_type,
        }
    }
}

/// Currently active inputs and outputs of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioRoute {
    pub inputs: Vec<RoutePort>,
    pub outputs: Vec<RoutePort>,
}

impl AudioRoute {
    pub fn new(inputs: Vec<RoutePort>, outputs: Vec<RoutePort>) -> Self {
        Self { inputs, outputs }
    }

    /// Returns `true` if a port with the given uid is part of the route.
    pub fn contains_port(&self, uid: &str) -> bool {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .any(|port| port.uid == uid)
    }
}

/// Session category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionCategory {
    Ambient,
    SoloAmbient,
    Playback,
    Record,
    PlayAndRecord,
    MultiRoute,
}

/// Session mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionMode {
    #[default]
    Default,
    GameChat,
    Measurement,
    MoviePlayback,
    SpokenAudio,
    VideoChat,
    VideoRecording,
    VoiceChat,
    VoicePrompt,
}

/// Route sharing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RouteSharingPolicy {
    #[default]
    Default,
    LongFormAudio,
    LongFormVideo,
    Independent,
}

/// Bit set of category options, using the host SDK's raw values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CategoryOptions(u32);

impl CategoryOptions {
    pub const NONE: Self = Self(0);
    pub const MIX_WITH_OTHERS: Self = Self(0x1);
    pub const DUCK_OTHERS: Self = Self(0x2);
    pub const ALLOW_BLUETOOTH: Self = Self(0x4);
    pub const DEFAULT_TO_SPEAKER: Self = Self(0x8);
    pub const INTERRUPT_SPOKEN_AUDIO_AND_MIX_WITH_OTHERS: Self = Self(0x11);
    pub const ALLOW_BLUETOOTH_A2DP: Self = Self(0x20);
    pub const ALLOW_AIR_PLAY: Self = Self(0x40);
    pub const OVERRIDE_MUTED_MICROPHONE_INTERRUPTION: Self = Self(0x80);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for CategoryOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

/// Options for activating or deactivating the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SetActiveOptions {
    /// Let interrupted apps resume when this session deactivates.
    pub notify_others_on_deactivation: bool,
}

/// Why the route changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteChangeReason {
    Unknown,
    NewDeviceAvailable,
    OldDeviceUnavailable,
    CategoryChange,
    Override,
    WakeFromSleep,
    NoSuitableRouteForCategory,
    RouteConfigurationChange,
}

impl RouteChangeReason {
    /// Maps the host SDK's raw reason value; unknown values become `Unknown`.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::NewDeviceAvailable,
            2 => Self::OldDeviceUnavailable,
            3 => Self::CategoryChange,
            4 => Self::Override,
            6 => Self::WakeFromSleep,
            7 => Self::NoSuitableRouteForCategory,
            8 => Self::RouteConfigurationChange,
            _ => Self::Unknown,
        }
    }
}

/// Options attached to an interruption-ended notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InterruptionOptions {
    /// The system suggests the app may resume playback.
    pub should_resume: bool,
}

/// Session interruption notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterruptionNotification {
    Began {
        /// `Some(true)` when the app was already suspended while the
        /// interruption started. Older hosts do not report it (`None`).
        was_suspended: Option<bool>,
    },
    Ended {
        options: InterruptionOptions,
    },
}

/// Notification delivered by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteNotification {
    Interruption(InterruptionNotification),
    RouteChange { reason: RouteChangeReason },
}

/// Route/session bridge implemented by the host.
///
/// All methods are asynchronous; implementations typically hop to the thread
/// that owns the native session and resolve when it answers.
#[async_trait::async_trait]
pub trait RouteSessionBridge: PlatformSendSync {
    /// Current route (active inputs and outputs).
    async fn current_route(&self) -> Result<AudioRoute>;

    /// Input ports the session could route to.
    async fn available_inputs(&self) -> Result<Vec<RoutePort>>;

    async fn category(&self) -> Result<SessionCategory>;

    async fn category_options(&self) -> Result<CategoryOptions>;

    async fn mode(&self) -> Result<SessionMode>;

    async fn route_sharing_policy(&self) -> Result<RouteSharingPolicy>;

    /// Applies category, mode, options and policy in one native call.
    async fn set_category(
        &self,
        category: SessionCategory,
        options: CategoryOptions,
        mode: SessionMode,
        policy: RouteSharingPolicy,
    ) -> Result<()>;

    async fn set_active(&self, active: bool, options: SetActiveOptions) -> Result<()>;

    /// Whether a phone or VoIP call currently owns the audio hardware.
    async fn is_in_call(&self) -> Result<bool>;

    /// Subscribes to interruption and route-change notifications.
    async fn subscribe(&self) -> Result<Box<dyn RouteNotificationStream>>;
}

/// Stream of session notifications.
#[async_trait::async_trait]
pub trait RouteNotificationStream: PlatformSend {
    /// Returns `None` when the stream is closed.
    async fn next(&mut self) -> Option<RouteNotification>;
}
