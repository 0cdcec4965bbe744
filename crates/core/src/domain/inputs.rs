//! Analog input front-end controls: input type, preamp gain, soft limit,
//! phase invert, phantom power, and stereo group assignment.
//!
//! These are plain scalar registers with no derived state; the engine only
//! mirrors them and validates setter domains. All of them are addressed with
//! `wValue = 0` and `wIndex = input`.

use serde::Serialize;
use tracing::debug;

use crate::domain::device::{DeviceContext, DeviceError, Result};
use crate::domain::registers::Control;

/// Front-end mode of one analog input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InputType {
    LinePlus4dB = 0,
    LineMinus10dB = 1,
    Microphone = 2,
    Instrument = 3,
}

impl InputType {
    pub fn from_wire(raw: u8) -> Self {
        match raw {
            1 => InputType::LineMinus10dB,
            2 => InputType::Microphone,
            3 => InputType::Instrument,
            _ => InputType::LinePlus4dB,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InputType::LinePlus4dB => "Line +4dB",
            InputType::LineMinus10dB => "Line -10dB",
            InputType::Microphone => "Microphone",
            InputType::Instrument => "Instrument",
        }
    }

    /// Preamp gain range for this mode, if it has a gain control at all
    pub fn gain_range(self) -> Option<(u8, u8)> {
        match self {
            InputType::Microphone => Some((0, 75)),
            InputType::Instrument => Some((0, 65)),
            _ => None,
        }
    }
}

/// Stereo group assignment for an input pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InputGroup {
    Off = 0,
    Group1 = 1,
    Group2 = 2,
}

impl InputGroup {
    pub fn from_wire(raw: u8) -> Self {
        match raw {
            1 => InputGroup::Group1,
            2 => InputGroup::Group2,
            _ => InputGroup::Off,
        }
    }
}

/// Mirror of one analog input's front-end settings
#[derive(Debug, Clone, Serialize)]
pub struct InputChannel {
    index: usize,
    pub input_type: InputType,
    pub soft_limit: bool,
    pub phase: bool,
    pub phantom: bool,
    pub mic_gain: u8,
    pub inst_gain: u8,
    pub group: InputGroup,
}

impl InputChannel {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            input_type: InputType::LinePlus4dB,
            soft_limit: false,
            phase: false,
            phantom: false,
            mic_gain: 0,
            inst_gain: 0,
            group: InputGroup::Off,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Preamp gain for the active input mode; 0 for the line modes, which
    /// have no preamp
    pub fn active_gain(&self) -> u8 {
        match self.input_type {
            InputType::Microphone => self.mic_gain,
            InputType::Instrument => self.inst_gain,
            _ => 0,
        }
    }

    /// Re-populate the mirror from the device
    pub fn refresh(&mut self, ctx: &DeviceContext) -> Result<()> {
        let idx = self.index as u16;
        self.input_type = InputType::from_wire(ctx.read(Control::InputType, 0, idx)?);
        self.soft_limit = ctx.read(Control::SoftLimit, 0, idx)? != 0;
        self.phase = ctx.read(Control::Phase, 0, idx)? != 0;
        self.phantom = ctx.read(Control::Phantom, 0, idx)? != 0;
        self.mic_gain = ctx.read(Control::MicGain, 0, idx)?;
        self.inst_gain = ctx.read(Control::InstGain, 0, idx)?;
        self.group = InputGroup::from_wire(ctx.read(Control::InputGroup, 0, idx)?);
        Ok(())
    }

    pub fn set_input_type(&mut self, ctx: &DeviceContext, input_type: InputType) -> Result<()> {
        ctx.write_scalar(Control::InputType, 0, self.index as u16, input_type as u8)?;
        self.input_type = input_type;
        debug!(input = self.index, mode = input_type.label(), "input type changed");
        Ok(())
    }

    /// Set the preamp gain for the active input mode.
    ///
    /// The firmware keeps the mic and instrument gain registers in step, so
    /// both are written regardless of mode.
    pub fn set_gain(&mut self, ctx: &DeviceContext, gain: u8) -> Result<()> {
        let (min, max) = self
            .input_type
            .gain_range()
            .ok_or(DeviceError::Unsupported("preamp gain on a line input"))?;

        if gain < min || gain > max {
            return Err(DeviceError::OutOfRange {
                control: "preamp gain",
                value: gain as i32,
                min: min as i32,
                max: max as i32,
            });
        }

        let idx = self.index as u16;
        ctx.write_scalar(Control::InstGain, 0, idx, gain)?;
        ctx.write_scalar(Control::MicGain, 0, idx, gain)?;
        self.mic_gain = gain;
        self.inst_gain = gain;
        debug!(input = self.index, gain, "preamp gain changed");
        Ok(())
    }

    pub fn set_soft_limit(&mut self, ctx: &DeviceContext, on: bool) -> Result<()> {
        ctx.write_scalar(Control::SoftLimit, 0, self.index as u16, on as u8)?;
        self.soft_limit = on;
        Ok(())
    }

    pub fn set_phase(&mut self, ctx: &DeviceContext, on: bool) -> Result<()> {
        ctx.write_scalar(Control::Phase, 0, self.index as u16, on as u8)?;
        self.phase = on;
        Ok(())
    }

    pub fn set_phantom(&mut self, ctx: &DeviceContext, on: bool) -> Result<()> {
        ctx.write_scalar(Control::Phantom, 0, self.index as u16, on as u8)?;
        self.phantom = on;
        Ok(())
    }

    pub fn set_group(&mut self, ctx: &DeviceContext, group: InputGroup) -> Result<()> {
        ctx.write_scalar(Control::InputGroup, 0, self.index as u16, group as u8)?;
        self.group = group;
        Ok(())
    }
}
