//! Gain law and quantization for the on-device mixer.
//!
//! The firmware takes per-channel stereo gains as 16-bit fixed-point values
//! against a full-scale reference of 8192 (0x2000), snapped to a logarithmic
//! grid spaced by 10^(1/200) (~0.0116 dB per step). The continuous gain for
//! a channel is its fader level plus the bus master level converted to a
//! linear magnitude, spread across left/right by a constant-power pan law.

use crate::domain::mixer::Pan;

/// Device fixed-point full-scale reference unit (0x2000)
pub const FULL_SCALE: f64 = 8192.0;

/// Below this raw value the quantizer is linear; the log of a near-zero
/// gain is numerically unstable
pub const LINEAR_REGION: f64 = 100.0;

/// Steps per decade of the firmware's gain grid (grid ratio 10^(1/200))
const STEPS_PER_DECADE: f64 = 200.0;

/// Linear magnitude for a combined fader + master level in dB
pub fn magnitude(combined_db: i32) -> f64 {
    FULL_SCALE * 10f64.powf(combined_db as f64 / 20.0)
}

/// Continuous (pre-quantization) stereo gain pair for one channel.
///
/// Channels without a pan control (the software return) place the full
/// magnitude on both sides. Panned channels follow a constant-power law:
/// `left^2 + right^2` stays fixed as the pan sweeps, so center pan sits
/// ~3 dB below either hard extreme. That attenuation is the point of the
/// law, not an artifact.
pub fn stereo_gain(level_db: i32, master_db: i32, pan: Option<Pan>) -> (f64, f64) {
    let m = magnitude(level_db + master_db);

    match pan {
        None => (m, m),
        Some(pan) => {
            let normalized = (pan.value() - Pan::MIN) as f64 / Pan::RANGE as f64;
            let theta = normalized * std::f64::consts::FRAC_PI_2;
            (m * theta.cos(), m * theta.sin())
        }
    }
}

/// Snap one continuous gain onto the firmware's gain grid.
///
/// Values inside the linear region are rounded directly; everything else is
/// rounded to the nearest power of 10^(1/200) relative to full scale. Valid
/// inputs (level + master within -96..=+12 dB) always fit in 16 bits.
pub fn quantize(gain: f64) -> u16 {
    if gain < LINEAR_REGION {
        return gain.round().max(0.0) as u16;
    }

    let steps = ((gain / FULL_SCALE).log10() * STEPS_PER_DECADE).round();
    (FULL_SCALE * 10f64.powf(steps / STEPS_PER_DECADE)).round() as u16
}
