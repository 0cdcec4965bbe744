//! On-device mixer state: channel strips, value domains, mute resolution.
//!
//! The Quartet runs two independent mixer buses. Each bus mixes 12
//! addressable input channels (4 analog, 8 digital) plus a software-return
//! channel fed from host playback, under one master fader. The device has no
//! notion of a partial update: every edit leads to a whole-bus recompute and
//! resend (see `bus`), so the gain vector on the wire is always internally
//! consistent.

use serde::Serialize;

use crate::domain::device::{DeviceError, Result};

pub mod bus;

pub use bus::MixerBus;

/// Fader level in whole decibels, -48..=+6.
///
/// -48 is the floor: an explicit silence command, not merely a very low
/// gain. A channel at the floor is muted no matter what its solo/mute flags
/// say, and a master at the floor silences the entire bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct LevelDb(i32);

impl LevelDb {
    pub const MIN: i32 = -48;
    pub const MAX: i32 = 6;

    pub const FLOOR: LevelDb = LevelDb(Self::MIN);
    pub const UNITY: LevelDb = LevelDb(0);

    /// Validate a level against its domain. Out-of-domain input is a caller
    /// error, never silently clamped: the domain is device-enforced.
    pub fn new(db: i32) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&db) {
            Ok(Self(db))
        } else {
            Err(DeviceError::OutOfRange {
                control: "mixer level",
                value: db,
                min: Self::MIN,
                max: Self::MAX,
            })
        }
    }

    pub fn db(self) -> i32 {
        self.0
    }

    pub fn is_floor(self) -> bool {
        self.0 == Self::MIN
    }

    /// Device register encoding: 0..=54
    pub(crate) fn to_wire(self) -> u8 {
        (self.0 - Self::MIN) as u8
    }

    /// Decode a hardware register value, clamping anything out of domain
    pub(crate) fn from_wire(raw: u8) -> Self {
        Self((raw as i32 + Self::MIN).clamp(Self::MIN, Self::MAX))
    }
}

/// Stereo pan position, -64 (hard left) ..= +64 (hard right).
///
/// Only input channels have a pan control; the software return and the
/// master fader do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Pan(i32);

impl Pan {
    pub const MIN: i32 = -64;
    pub const MAX: i32 = 64;
    pub const RANGE: i32 = Self::MAX - Self::MIN;

    pub const CENTER: Pan = Pan(0);

    pub fn new(pan: i32) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&pan) {
            Ok(Self(pan))
        } else {
            Err(DeviceError::OutOfRange {
                control: "mixer pan",
                value: pan,
                min: Self::MIN,
                max: Self::MAX,
            })
        }
    }

    pub fn value(self) -> i32 {
        self.0
    }

    /// Device register encoding: 0..=128
    pub(crate) fn to_wire(self) -> u8 {
        (self.0 - Self::MIN) as u8
    }

    pub(crate) fn from_wire(raw: u8) -> Self {
        Self((raw as i32 + Self::MIN).clamp(Self::MIN, Self::MAX))
    }
}

/// Addressable non-master channel on a mixer bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Channel {
    /// Input channel by index (0..12 on the Quartet; only the first 4 are
    /// physically wired)
    Input(usize),
    /// Return-from-host channel, one per bus
    SoftwareReturn,
}

/// Mutable settings of one non-master channel strip.
///
/// `pan` is present iff the strip belongs to an input channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelStrip {
    pub level: LevelDb,
    pub pan: Option<Pan>,
    pub solo: bool,
    pub mute: bool,
}

impl ChannelStrip {
    /// Default state of an input strip: unity, centered, no flags
    pub fn input() -> Self {
        Self {
            level: LevelDb::UNITY,
            pan: Some(Pan::CENTER),
            solo: false,
            mute: false,
        }
    }

    /// Default state of the software-return strip (no pan control)
    pub fn software_return() -> Self {
        Self {
            level: LevelDb::UNITY,
            pan: None,
            solo: false,
            mute: false,
        }
    }
}

/// Resolve the final mute decision for every strip of one bus.
///
/// `strips` holds the bus's channels in wire order (inputs first, software
/// return last); the returned vector is index-aligned with it. Precedence,
/// strictly in order:
///
/// 1. master at the floor mutes everything;
/// 2. any solo mutes every non-solo strip;
/// 3. an explicit mute flag or a level at the floor mutes unconditionally,
///    overriding a solo exemption but never un-muting.
pub fn resolve_mutes(strips: &[ChannelStrip], master: LevelDb) -> Vec<bool> {
    if master.is_floor() {
        return vec![true; strips.len()];
    }

    let mut muted = vec![false; strips.len()];

    if strips.iter().any(|s| s.solo) {
        for (m, strip) in muted.iter_mut().zip(strips) {
            if !strip.solo {
                *m = true;
            }
        }
    }

    for (m, strip) in muted.iter_mut().zip(strips) {
        if strip.mute || strip.level.is_floor() {
            *m = true;
        }
    }

    muted
}
