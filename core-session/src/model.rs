//! Unified device and interruption model shared by both audio backends.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Device type spanning both native taxonomies.
///
/// Every native port or device type maps to exactly one value; anything the
/// mapping does not know becomes [`DeviceType::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceType {
    #[default]
    Unknown,
    BuiltInEarpiece,
    BuiltInSpeaker,
    WiredHeadset,
    WiredHeadphones,
    HeadsetMic,
    LineAnalog,
    LineDigital,
    BluetoothSco,
    BluetoothA2dp,
    Hdmi,
    HdmiArc,
    UsbAudio,
    Dock,
    Fm,
    BuiltInMic,
    FmTuner,
    TvTuner,
    Telephony,
    AuxLine,
    Ip,
    Bus,
    HearingAid,
    AirPlay,
    BluetoothLe,
    CarAudio,
    DisplayPort,
    FireWire,
    Pci,
    Thunderbolt,
    Avb,
    Virtual,
}

/// An audio input and/or output endpoint.
///
/// Identity is the backend-provided `id` alone: two records with the same id
/// compare equal even if their names or flags differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioDevice {
    pub id: String,
    pub name: String,
    pub is_input: bool,
    pub is_output: bool,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
}

impl AudioDevice {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        is_input: bool,
        is_output: bool,
        device_type: DeviceType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_input,
            is_output,
            device_type,
        }
    }
}

impl PartialEq for AudioDevice {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AudioDevice {}

impl Hash for AudioDevice {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Ordered collection of devices with unique ids.
///
/// Construction merges entries that share an id: the first occurrence keeps
/// its position, name and type, and the direction flags are OR-ed. A port
/// that shows up in both the input and the output list therefore becomes one
/// device that is both an input and an output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<AudioDevice>", into = "Vec<AudioDevice>")]
pub struct DeviceSnapshot {
    devices: Vec<AudioDevice>,
}

impl DeviceSnapshot {
    pub fn new(devices: impl IntoIterator<Item = AudioDevice>) -> Self {
        let mut merged: Vec<AudioDevice> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for device in devices {
            match positions.get(&device.id) {
                Some(&index) => {
                    let existing = &mut merged[index];
                    existing.is_input |= device.is_input;
                    existing.is_output |= device.is_output;
                }
                None => {
                    positions.insert(device.id.clone(), merged.len());
                    merged.push(device);
                }
            }
        }

        Self { devices: merged }
    }

    pub fn devices(&self) -> &[AudioDevice] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AudioDevice> {
        self.devices.iter()
    }

    pub fn get(&self, id: &str) -> Option<&AudioDevice> {
        self.devices.iter().find(|device| device.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn inputs(&self) -> impl Iterator<Item = &AudioDevice> {
        self.devices.iter().filter(|device| device.is_input)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &AudioDevice> {
        self.devices.iter().filter(|device| device.is_output)
    }

    /// Same length and the same id at every position.
    ///
    /// The same devices in a different order are *not* equal.
    pub fn positionally_equal(&self, other: &DeviceSnapshot) -> bool {
        self.devices.len() == other.devices.len()
            && self
                .devices
                .iter()
                .zip(other.devices.iter())
                .all(|(left, right)| left.id == right.id)
    }

    pub fn into_vec(self) -> Vec<AudioDevice> {
        self.devices
    }
}

impl From<Vec<AudioDevice>> for DeviceSnapshot {
    fn from(devices: Vec<AudioDevice>) -> Self {
        Self::new(devices)
    }
}

impl From<DeviceSnapshot> for Vec<AudioDevice> {
    fn from(snapshot: DeviceSnapshot) -> Self {
        snapshot.devices
    }
}

impl FromIterator<AudioDevice> for DeviceSnapshot {
    fn from_iter<I: IntoIterator<Item = AudioDevice>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a DeviceSnapshot {
    type Item = &'a AudioDevice;
    type IntoIter = std::slice::Iter<'a, AudioDevice>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.iter()
    }
}

/// Devices that appeared and disappeared between two observations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicesChangedEvent {
    pub added: Vec<AudioDevice>,
    pub removed: Vec<AudioDevice>,
}

impl DevicesChangedEvent {
    pub fn added(devices: Vec<AudioDevice>) -> Self {
        Self {
            added: devices,
            removed: Vec::new(),
        }
    }

    pub fn removed(devices: Vec<AudioDevice>) -> Self {
        Self {
            added: Vec::new(),
            removed: devices,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// How the application should react to an interruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InterruptionType {
    /// Pause on begin; resume on end.
    Pause,
    /// Lower the volume on begin; restore it on end.
    Duck,
    /// Pause on begin; do not resume on end.
    Unknown,
}

/// Audio interruption began or ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterruptionEvent {
    pub begin: bool,
    #[serde(rename = "type")]
    pub interruption_type: InterruptionType,
}

impl InterruptionEvent {
    pub fn began(interruption_type: InterruptionType) -> Self {
        Self {
            begin: true,
            interruption_type,
        }
    }

    pub fn ended(interruption_type: InterruptionType) -> Self {
        Self {
            begin: false,
            interruption_type,
        }
    }
}
