//! Native type normalization.
//!
//! Pure mappings from route ports and native device codes onto the unified
//! [`DeviceType`] / [`AudioDevice`] model. None of these functions fail: an
//! unrecognized native value becomes [`DeviceType::Unknown`].

use bridge_traits::focus::{NativeDeviceInfo, NativeDeviceType};
use bridge_traits::route::{AudioRoute, PortType, RoutePort};

use crate::model::{AudioDevice, DeviceSnapshot, DeviceType};

/// Maps a route port type.
///
/// Headphone ports carry no hint about a microphone, so they are classified
/// by `input_context`: a headset microphone among those inputs means the
/// plug is a headset.
pub fn port_device_type(port_type: &PortType, input_context: &[RoutePort]) -> DeviceType {
    match port_type {
        PortType::BuiltInMic => DeviceType::BuiltInMic,
        PortType::HeadsetMic => DeviceType::HeadsetMic,
        PortType::LineIn | PortType::LineOut => DeviceType::LineAnalog,
        PortType::Headphones => {
            if has_headset_mic(input_context) {
                DeviceType::WiredHeadset
            } else {
                DeviceType::WiredHeadphones
            }
        }
        PortType::BluetoothA2dp => DeviceType::BluetoothA2dp,
        PortType::BluetoothHfp => DeviceType::BluetoothSco,
        PortType::BluetoothLe => DeviceType::BluetoothLe,
        PortType::BuiltInReceiver => DeviceType::BuiltInEarpiece,
        PortType::BuiltInSpeaker => DeviceType::BuiltInSpeaker,
        PortType::Hdmi => DeviceType::Hdmi,
        PortType::AirPlay => DeviceType::AirPlay,
        PortType::UsbAudio => DeviceType::UsbAudio,
        PortType::CarAudio => DeviceType::CarAudio,
        PortType::Virtual => DeviceType::Virtual,
        PortType::Pci => DeviceType::Pci,
        PortType::FireWire => DeviceType::FireWire,
        PortType::DisplayPort => DeviceType::DisplayPort,
        PortType::Avb => DeviceType::Avb,
        PortType::Thunderbolt => DeviceType::Thunderbolt,
        PortType::Other(_) => DeviceType::Unknown,
    }
}

pub fn has_headset_mic(inputs: &[RoutePort]) -> bool {
    inputs
        .iter()
        .any(|port| port.port_type == PortType::HeadsetMic)
}

/// Maps a native integer device code.
pub fn native_device_type(code: NativeDeviceType) -> DeviceType {
    match code.raw() {
        1 => DeviceType::BuiltInEarpiece,
        2 | 24 => DeviceType::BuiltInSpeaker,
        3 => DeviceType::WiredHeadset,
        4 => DeviceType::WiredHeadphones,
        5 => DeviceType::LineAnalog,
        6 => DeviceType::LineDigital,
        7 => DeviceType::BluetoothSco,
        8 => DeviceType::BluetoothA2dp,
        9 => DeviceType::Hdmi,
        10 | 29 => DeviceType::HdmiArc,
        11 | 12 | 22 => DeviceType::UsbAudio,
        13 | 31 => DeviceType::Dock,
        14 => DeviceType::Fm,
        15 => DeviceType::BuiltInMic,
        16 => DeviceType::FmTuner,
        17 => DeviceType::TvTuner,
        18 => DeviceType::Telephony,
        19 => DeviceType::AuxLine,
        20 => DeviceType::Ip,
        21 => DeviceType::Bus,
        23 => DeviceType::HearingAid,
        25 => DeviceType::Virtual,
        26 | 27 | 30 => DeviceType::BluetoothLe,
        _ => DeviceType::Unknown,
    }
}

pub fn port_device(port: &RoutePort, is_input: bool, input_context: &[RoutePort]) -> AudioDevice {
    AudioDevice::new(
        port.uid.clone(),
        port.port_name.clone(),
        is_input,
        !is_input,
        port_device_type(&port.port_type, input_context),
    )
}

pub fn native_device(info: &NativeDeviceInfo) -> AudioDevice {
    AudioDevice::new(
        info.id.to_string(),
        info.product_name.clone(),
        info.is_source,
        info.is_sink,
        native_device_type(info.device_type),
    )
}

/// Builds a snapshot from input ports and output ports.
///
/// Inputs come first; a port listed on both sides becomes one device with
/// both flags set. Headphone classification uses `inputs` as its context.
pub fn ports_snapshot(inputs: &[RoutePort], outputs: &[RoutePort]) -> DeviceSnapshot {
    let input_devices = inputs.iter().map(|port| port_device(port, true, inputs));
    let output_devices = outputs.iter().map(|port| port_device(port, false, inputs));
    input_devices.chain(output_devices).collect()
}

/// Devices that make up a route.
pub fn route_snapshot(route: &AudioRoute) -> DeviceSnapshot {
    ports_snapshot(&route.inputs, &route.outputs)
}
