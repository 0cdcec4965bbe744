//! Monitor and line output controls: speaker/headphone strips, line output
//! routing, and the ±4dBV/-10dBV line reference level.
//!
//! The device stores monitor levels negated (0..=64 for 0..=-64 dB) and
//! keeps the line reference level once per physical sub-line. The two
//! sub-line registers are commanded together and should never legitimately
//! diverge; a divergence on read is surfaced as a consistency warning, not
//! an error.

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::device::{DeviceContext, DeviceError, Result};
use crate::domain::registers::Control;

/// Routing destination index per output panel (line 1/2, line 3/4,
/// line 5/6, headphone)
pub const OUTPUT_SOURCE_DEST: [u16; 4] = [0, 3, 2, 1];

/// Panel order of the physical line output pairs
pub const LINE_OUTPUT_ORDER: [usize; 3] = [0, 3, 2];

/// Raw register values selecting the line pair that feeds the speakers
pub const SPEAKER_LINE_SELECT: [u8; 3] = [1, 2, 4];

/// Monitor output level in whole decibels, -64..=0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct MonitorLevelDb(i32);

impl MonitorLevelDb {
    pub const MIN: i32 = -64;
    pub const MAX: i32 = 0;

    pub fn new(db: i32) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&db) {
            Ok(Self(db))
        } else {
            Err(DeviceError::OutOfRange {
                control: "output level",
                value: db,
                min: Self::MIN,
                max: Self::MAX,
            })
        }
    }

    pub fn db(self) -> i32 {
        self.0
    }

    /// Stored negated on the device: 0..=64
    pub(crate) fn to_wire(self) -> u8 {
        (-self.0) as u8
    }

    pub(crate) fn from_wire(raw: u8) -> Self {
        Self((-(raw as i32)).clamp(Self::MIN, Self::MAX))
    }
}

/// Speaker output configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpeakerConfig {
    Line = 0,
    Stereo = 1,
    TwoSpeakerSets = 2,
    ThreeSpeakerSets = 3,
    Surround51 = 4,
}

impl SpeakerConfig {
    pub fn from_wire(raw: u8) -> Self {
        match raw {
            1 => SpeakerConfig::Stereo,
            2 => SpeakerConfig::TwoSpeakerSets,
            3 => SpeakerConfig::ThreeSpeakerSets,
            4 => SpeakerConfig::Surround51,
            _ => SpeakerConfig::Line,
        }
    }
}

/// Line reference level of an output pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineLevel {
    Plus4dBV = 0,
    Minus10dBV = 1,
}

impl LineLevel {
    pub fn from_wire(raw: u8) -> Self {
        if raw == 1 {
            LineLevel::Minus10dBV
        } else {
            LineLevel::Plus4dBV
        }
    }
}

/// The two monitor outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MonitorOutput {
    Speaker = 0,
    Headphone = 1,
}

/// A paired line-level register disagreement found during refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineLevelMismatch {
    pub line_index: u16,
    pub primary: u8,
    pub secondary: u8,
}

/// Mirror of one monitor output strip (speaker or headphone)
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStrip {
    output: MonitorOutput,
    pub level: MonitorLevelDb,
    pub mute: bool,
    pub dim: bool,
    pub mono: bool,
    /// Speaker configuration; the headphone strip has none
    pub config: Option<SpeakerConfig>,
    /// Speaker: raw line-pair select value; headphone: source selection
    pub source: u8,
}

impl MonitorStrip {
    pub fn speaker() -> Self {
        Self {
            output: MonitorOutput::Speaker,
            level: MonitorLevelDb(0),
            mute: false,
            dim: false,
            mono: false,
            config: Some(SpeakerConfig::Stereo),
            source: SPEAKER_LINE_SELECT[0],
        }
    }

    pub fn headphone() -> Self {
        Self {
            output: MonitorOutput::Headphone,
            level: MonitorLevelDb(0),
            mute: false,
            dim: false,
            mono: false,
            config: None,
            source: 0,
        }
    }

    pub fn output(&self) -> MonitorOutput {
        self.output
    }

    fn index(&self) -> u16 {
        self.output as u16
    }

    pub fn refresh(&mut self, ctx: &DeviceContext) -> Result<()> {
        let idx = self.index();
        self.level = MonitorLevelDb::from_wire(ctx.read(Control::OutputLevel, 0, idx)?);
        self.mute = ctx.read(Control::OutputMute, 0, idx)? != 0;
        self.dim = ctx.read(Control::OutputDim, 0, idx)? != 0;
        self.mono = ctx.read(Control::OutputMono, 0, idx)? != 0;

        match self.output {
            MonitorOutput::Speaker => {
                self.source = ctx.read(Control::OutputLineSelect, 0, idx)?;
                self.config =
                    Some(SpeakerConfig::from_wire(ctx.read(Control::OutputConfig, 0, idx)?));
            }
            MonitorOutput::Headphone => {
                self.source =
                    ctx.read(Control::OutputSource, 0, OUTPUT_SOURCE_DEST[idx as usize])?;
            }
        }

        Ok(())
    }

    pub fn set_level(&mut self, ctx: &DeviceContext, level: MonitorLevelDb) -> Result<()> {
        ctx.write_scalar(Control::OutputLevel, 0, self.index(), level.to_wire())?;
        self.level = level;
        debug!(output = ?self.output, db = level.db(), "output level changed");
        Ok(())
    }

    pub fn set_mute(&mut self, ctx: &DeviceContext, on: bool) -> Result<()> {
        ctx.write_scalar(Control::OutputMute, 0, self.index(), on as u8)?;
        self.mute = on;
        Ok(())
    }

    pub fn set_dim(&mut self, ctx: &DeviceContext, on: bool) -> Result<()> {
        ctx.write_scalar(Control::OutputDim, 0, self.index(), on as u8)?;
        self.dim = on;
        Ok(())
    }

    pub fn set_mono(&mut self, ctx: &DeviceContext, on: bool) -> Result<()> {
        ctx.write_scalar(Control::OutputMono, 0, self.index(), on as u8)?;
        self.mono = on;
        Ok(())
    }

    /// Select the line pair feeding the speakers (speaker strip only)
    pub fn set_speaker_line(&mut self, ctx: &DeviceContext, choice: usize) -> Result<()> {
        if self.output != MonitorOutput::Speaker {
            return Err(DeviceError::Unsupported("line select on the headphone output"));
        }
        let select = *SPEAKER_LINE_SELECT
            .get(choice)
            .ok_or(DeviceError::OutOfRange {
                control: "speaker line select",
                value: choice as i32,
                min: 0,
                max: SPEAKER_LINE_SELECT.len() as i32 - 1,
            })?;

        ctx.write_scalar(Control::OutputLineSelect, 0, 0, select)?;
        self.source = select;
        Ok(())
    }

    /// Select the headphone source (headphone strip only)
    pub fn set_headphone_source(&mut self, ctx: &DeviceContext, source: u8) -> Result<()> {
        if self.output != MonitorOutput::Headphone {
            return Err(DeviceError::Unsupported("source select on the speaker output"));
        }

        ctx.write_scalar(
            Control::OutputSource,
            0,
            OUTPUT_SOURCE_DEST[self.index() as usize],
            source,
        )?;
        self.source = source;
        Ok(())
    }

    pub fn set_speaker_config(&mut self, ctx: &DeviceContext, config: SpeakerConfig) -> Result<()> {
        if self.output != MonitorOutput::Speaker {
            return Err(DeviceError::Unsupported("speaker config on the headphone output"));
        }

        ctx.write_scalar(Control::OutputConfig, 0, 0, config as u8)?;
        self.config = Some(config);
        Ok(())
    }
}

/// Mirror of one physical line output pair
#[derive(Debug, Clone, Serialize)]
pub struct LineOutput {
    index: usize,
    pub source: u8,
    pub line_level: LineLevel,
}

impl LineOutput {
    /// Line outputs exist only at the device indices in
    /// [`LINE_OUTPUT_ORDER`]; anything else (the headphone index included)
    /// is rejected
    pub fn new(index: usize) -> Result<Self> {
        if !LINE_OUTPUT_ORDER.contains(&index) {
            return Err(DeviceError::Unsupported("no line output at this index"));
        }
        Ok(Self::unchecked(index))
    }

    fn unchecked(index: usize) -> Self {
        Self {
            index,
            source: 0,
            line_level: LineLevel::Plus4dBV,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    fn dest(&self) -> u16 {
        OUTPUT_SOURCE_DEST[self.index]
    }

    /// First of the pair's two per-sub-line level registers
    fn line_pair_index(&self) -> u16 {
        self.dest() * 2
    }

    /// Re-read source and line level.
    ///
    /// The line level lives in two registers, one per sub-line; they are
    /// always commanded together, so a divergence is reported as a warning
    /// while the refresh itself carries on.
    pub fn refresh(&mut self, ctx: &DeviceContext) -> Result<Option<LineLevelMismatch>> {
        self.source = ctx.read(Control::OutputSource, 0, self.dest())?;

        let li = self.line_pair_index();
        let primary = ctx.read(Control::OutputLineLevel, 0, li)?;
        let secondary = ctx.read(Control::OutputLineLevel, 0, li + 1)?;
        self.line_level = LineLevel::from_wire(primary);

        if primary != secondary {
            warn!(
                line = li,
                primary, secondary, "paired line-level registers disagree"
            );
            return Ok(Some(LineLevelMismatch {
                line_index: li,
                primary,
                secondary,
            }));
        }

        Ok(None)
    }

    pub fn set_source(&mut self, ctx: &DeviceContext, source: u8) -> Result<()> {
        ctx.write_scalar(Control::OutputSource, 0, self.dest(), source)?;
        self.source = source;
        Ok(())
    }

    /// Set the reference level, writing both sub-line registers
    pub fn set_line_level(&mut self, ctx: &DeviceContext, level: LineLevel) -> Result<()> {
        let li = self.line_pair_index();
        ctx.write_scalar(Control::OutputLineLevel, 0, li, level as u8)?;
        ctx.write_scalar(Control::OutputLineLevel, 0, li + 1, level as u8)?;
        self.line_level = level;
        debug!(line = li, ?level, "line reference level changed");
        Ok(())
    }
}

/// All output-side mirrors of the device
#[derive(Debug, Clone, Serialize)]
pub struct OutputBank {
    pub speaker: MonitorStrip,
    pub headphone: MonitorStrip,
    pub lines: Vec<LineOutput>,
}

impl OutputBank {
    pub fn new() -> Self {
        Self {
            speaker: MonitorStrip::speaker(),
            headphone: MonitorStrip::headphone(),
            lines: LINE_OUTPUT_ORDER.iter().map(|&i| LineOutput::unchecked(i)).collect(),
        }
    }

    /// Refresh every output mirror, collecting line-level mismatches
    /// instead of aborting on them
    pub fn refresh(&mut self, ctx: &DeviceContext) -> Result<Vec<LineLevelMismatch>> {
        self.speaker.refresh(ctx)?;
        self.headphone.refresh(ctx)?;

        let mut mismatches = Vec::new();
        for line in &mut self.lines {
            if let Some(mismatch) = line.refresh(ctx)? {
                mismatches.push(mismatch);
            }
        }

        Ok(mismatches)
    }
}

impl Default for OutputBank {
    fn default() -> Self {
        Self::new()
    }
}
