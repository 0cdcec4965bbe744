//! Static register schema for the supported device model.
//!
//! Maps every logical control to its vendor-request code and records the
//! fixed constants of the Quartet's control surface. The table is pure data;
//! an unknown control is unrepresentable because `Control` is an exhaustive
//! enum, not a string lookup.

use serde::Serialize;

/// Logical controls exposed by the device firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Control {
    // Per-input analog front-end controls (wValue = 0, wIndex = input)
    SoftLimit,
    Phase,
    Phantom,
    InputType,
    MicGain,
    InstGain,
    InputGroup,

    // Monitor/line output controls (wValue = 0, wIndex = output)
    OutputLevel,
    OutputMute,
    OutputDim,
    OutputConfig,
    OutputMono,
    OutputLineSelect,
    OutputSource,
    OutputLineLevel,

    // Mixer controls (wValue = bus, wIndex = channel, except where noted)
    /// Bulk stereo gain vector write: wValue = 0, wIndex = bus*2 (+1 right)
    MixerGains,
    /// Software-return source select: wValue = 0, wIndex = bus
    MixerSoftReturnSource,
    MixerLevel,
    MixerPan,
    MixerSolo,
    MixerMute,
}

impl Control {
    /// Vendor request code used for this control's control transfers
    pub const fn request(self) -> u8 {
        match self {
            Control::MixerGains => 16,
            Control::SoftLimit => 17,
            Control::Phase => 19,
            Control::Phantom => 21,
            Control::InputType => 22,
            Control::OutputLevel => 51,
            Control::MicGain => 52,
            Control::OutputMute => 53,
            Control::MixerSoftReturnSource => 54,
            Control::InstGain => 62,
            Control::OutputDim => 64,
            Control::InputGroup => 68,
            Control::OutputConfig => 69,
            Control::OutputMono => 70,
            Control::OutputLineSelect => 71,
            Control::MixerLevel => 76,
            Control::MixerPan => 77,
            Control::MixerSolo => 78,
            Control::MixerMute => 79,
            Control::OutputSource => 83,
            Control::OutputLineLevel => 182,
        }
    }
}

/// Fixed constants of one supported device model
#[derive(Debug, Clone, Serialize)]
pub struct DeviceModel {
    pub vendor_id: u16,
    pub product_id: u16,
    pub product_name: &'static str,

    /// Physically wired analog inputs
    pub analog_inputs: usize,
    /// Independent on-device mixer buses
    pub mixer_buses: usize,
    /// Addressable mixer input channels (4 analog + 8 digital)
    pub mixer_channels: usize,
    /// Channel index of the software-return strip
    pub software_return_index: u16,
    /// Channel index of the bus master fader
    pub master_index: u16,

    /// Selectable host playback pairs for the software return
    pub playback_pairs: usize,
}

impl DeviceModel {
    /// Apogee Quartet
    pub const fn quartet() -> Self {
        Self {
            vendor_id: 0x0c60,
            product_id: 0x0014,
            product_name: "Apogee Quartet",
            analog_inputs: 4,
            mixer_buses: 2,
            mixer_channels: 12,
            software_return_index: 12,
            master_index: 13,
            playback_pairs: 4,
        }
    }
}
