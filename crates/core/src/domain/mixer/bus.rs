//! One mixer bus: state mirror, setters, and the recompute-and-send path.
//!
//! Every setter follows the same contract: write the scalar register to the
//! device first, mirror the new value only once the device accepted it, then
//! recompute and resend the whole bus's gain vectors. The scalar registers
//! only store settings in the hardware; they do not change what the mixer
//! does until the bulk gain vectors are pushed.
//!
//! A recompute-and-send must run to completion as one unit; callers that
//! share a bus across threads must serialize access around it (the device
//! has no compare-and-swap of its own). The `&mut self` receiver enforces
//! that within a single owner.

use serde::Serialize;
use tracing::{debug, trace};

use crate::domain::device::{DeviceContext, DeviceError, Result};
use crate::domain::gain;
use crate::domain::mixer::{resolve_mutes, Channel, ChannelStrip, LevelDb, Pan};
use crate::domain::registers::{Control, DeviceModel};
use crate::domain::wire::{self, Side};

/// State mirror and controller for one on-device mixer bus
#[derive(Debug, Clone, Serialize)]
pub struct MixerBus {
    index: usize,
    inputs: Vec<ChannelStrip>,
    software_return: ChannelStrip,
    /// Host playback pair feeding the software return
    software_return_source: u8,
    master: LevelDb,
}

impl MixerBus {
    /// Create a bus mirror with default settings (used when operating
    /// without hardware; `refresh` overwrites it from the device)
    pub fn new(index: usize, model: &DeviceModel) -> Result<Self> {
        if index >= model.mixer_buses {
            return Err(DeviceError::UnknownBus(index));
        }

        Ok(Self {
            index,
            inputs: vec![ChannelStrip::input(); model.mixer_channels],
            software_return: ChannelStrip::software_return(),
            software_return_source: 0,
            master: LevelDb::UNITY,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn master(&self) -> LevelDb {
        self.master
    }

    pub fn software_return_source(&self) -> u8 {
        self.software_return_source
    }

    pub fn inputs(&self) -> &[ChannelStrip] {
        &self.inputs
    }

    pub fn software_return(&self) -> &ChannelStrip {
        &self.software_return
    }

    pub fn strip(&self, channel: Channel) -> Result<&ChannelStrip> {
        match channel {
            Channel::Input(i) => self
                .inputs
                .get(i)
                .ok_or(DeviceError::UnknownChannel(i)),
            Channel::SoftwareReturn => Ok(&self.software_return),
        }
    }

    /// Wire channel index for a strip; validates input bounds
    fn channel_index(&self, model: &DeviceModel, channel: Channel) -> Result<u16> {
        match channel {
            Channel::Input(i) if i < model.mixer_channels => Ok(i as u16),
            Channel::Input(i) => Err(DeviceError::UnknownChannel(i)),
            Channel::SoftwareReturn => Ok(model.software_return_index),
        }
    }

    /// Only called after `channel_index` validated the channel
    fn strip_mut(&mut self, channel: Channel) -> &mut ChannelStrip {
        match channel {
            Channel::Input(i) => &mut self.inputs[i],
            Channel::SoftwareReturn => &mut self.software_return,
        }
    }

    /// Re-populate the mirror from the device's stored settings.
    ///
    /// Never triggers a send: the bulk gain state is not fully readable
    /// back from hardware, so a blind refresh-then-resend would be lossy.
    pub fn refresh(&mut self, ctx: &DeviceContext) -> Result<()> {
        let bus = self.index as u16;

        for (i, strip) in self.inputs.iter_mut().enumerate() {
            let ch = i as u16;
            strip.level = LevelDb::from_wire(ctx.read(Control::MixerLevel, bus, ch)?);
            strip.pan = Some(Pan::from_wire(ctx.read(Control::MixerPan, bus, ch)?));
            strip.solo = ctx.read(Control::MixerSolo, bus, ch)? != 0;
            strip.mute = ctx.read(Control::MixerMute, bus, ch)? != 0;
        }

        let swr = ctx.model().software_return_index;
        self.software_return.level = LevelDb::from_wire(ctx.read(Control::MixerLevel, bus, swr)?);
        self.software_return.solo = ctx.read(Control::MixerSolo, bus, swr)? != 0;
        self.software_return.mute = ctx.read(Control::MixerMute, bus, swr)? != 0;
        self.software_return_source = ctx.read(Control::MixerSoftReturnSource, 0, bus)?;

        self.master =
            LevelDb::from_wire(ctx.read(Control::MixerLevel, bus, ctx.model().master_index)?);

        trace!(bus = self.index, "mixer bus mirror refreshed");
        Ok(())
    }

    /// Set a channel fader level and resend the bus
    pub fn set_level(&mut self, ctx: &DeviceContext, channel: Channel, level: LevelDb) -> Result<()> {
        let index = self.channel_index(ctx.model(), channel)?;
        ctx.write_scalar(Control::MixerLevel, self.index as u16, index, level.to_wire())?;
        self.strip_mut(channel).level = level;
        debug!(bus = self.index, ?channel, db = level.db(), "mixer level changed");
        self.sync(ctx)
    }

    /// Set an input channel's pan position and resend the bus
    pub fn set_pan(&mut self, ctx: &DeviceContext, channel: Channel, pan: Pan) -> Result<()> {
        if !matches!(channel, Channel::Input(_)) {
            return Err(DeviceError::Unsupported("pan on the software return"));
        }

        let index = self.channel_index(ctx.model(), channel)?;
        ctx.write_scalar(Control::MixerPan, self.index as u16, index, pan.to_wire())?;
        self.strip_mut(channel).pan = Some(pan);
        debug!(bus = self.index, ?channel, pan = pan.value(), "mixer pan changed");
        self.sync(ctx)
    }

    /// Set a channel's solo flag and resend the bus
    pub fn set_solo(&mut self, ctx: &DeviceContext, channel: Channel, solo: bool) -> Result<()> {
        let index = self.channel_index(ctx.model(), channel)?;
        ctx.write_scalar(Control::MixerSolo, self.index as u16, index, solo as u8)?;
        self.strip_mut(channel).solo = solo;
        debug!(bus = self.index, ?channel, solo, "mixer solo changed");
        self.sync(ctx)
    }

    /// Set a channel's mute flag and resend the bus
    pub fn set_mute(&mut self, ctx: &DeviceContext, channel: Channel, mute: bool) -> Result<()> {
        let index = self.channel_index(ctx.model(), channel)?;
        ctx.write_scalar(Control::MixerMute, self.index as u16, index, mute as u8)?;
        self.strip_mut(channel).mute = mute;
        debug!(bus = self.index, ?channel, mute, "mixer mute changed");
        self.sync(ctx)
    }

    /// Set the bus master level and resend the bus.
    ///
    /// A master at -48 dB silences every channel on the bus.
    pub fn set_master_level(&mut self, ctx: &DeviceContext, level: LevelDb) -> Result<()> {
        let index = ctx.model().master_index;
        ctx.write_scalar(Control::MixerLevel, self.index as u16, index, level.to_wire())?;
        self.master = level;
        debug!(bus = self.index, db = level.db(), "mixer master level changed");
        self.sync(ctx)
    }

    /// Select the host playback pair feeding the software return.
    ///
    /// Pure routing inside the device; the gain vectors are unaffected, so
    /// no resend happens.
    pub fn set_software_return_source(&mut self, ctx: &DeviceContext, source: u8) -> Result<()> {
        let pairs = ctx.model().playback_pairs;
        if source as usize >= pairs {
            return Err(DeviceError::OutOfRange {
                control: "software return source",
                value: source as i32,
                min: 0,
                max: pairs as i32 - 1,
            });
        }

        ctx.write_scalar(Control::MixerSoftReturnSource, 0, self.index as u16, source)?;
        self.software_return_source = source;
        debug!(bus = self.index, source, "software return source changed");
        Ok(())
    }

    /// Recompute the whole bus's gain vectors from the mirror and push both
    /// stereo sides to the device.
    ///
    /// Always covers every channel, so a partially-updated gain vector is
    /// never transmitted. Two device writes; a failure of the first aborts
    /// the second, and neither is retried.
    pub fn sync(&self, ctx: &DeviceContext) -> Result<()> {
        let mut strips = Vec::with_capacity(self.inputs.len() + 1);
        strips.extend_from_slice(&self.inputs);
        strips.push(self.software_return);

        let muted = resolve_mutes(&strips, self.master);

        let input_gains: Vec<(u16, u16)> = self
            .inputs
            .iter()
            .zip(&muted)
            .map(|(strip, &muted)| {
                if muted {
                    (0, 0)
                } else {
                    let (l, r) =
                        gain::stereo_gain(strip.level.db(), self.master.db(), strip.pan);
                    (gain::quantize(l), gain::quantize(r))
                }
            })
            .collect();

        let swr_gain = if muted[self.inputs.len()] {
            0
        } else {
            let (g, _) =
                gain::stereo_gain(self.software_return.level.db(), self.master.db(), None);
            gain::quantize(g)
        };

        let (left, right) = wire::encode_bus_payloads(&input_gains, swr_gain);

        trace!(bus = self.index, "pushing mixer gain vectors");
        ctx.write_payload(Control::MixerGains, 0, Side::Left.wire_index(self.index), &left)?;
        ctx.write_payload(Control::MixerGains, 0, Side::Right.wire_index(self.index), &right)
    }
}
