//! Domain entities and business rules

pub mod config;
pub mod device;
pub mod gain;
pub mod inputs;
pub mod mixer;
pub mod outputs;
pub mod registers;
pub mod wire;

#[cfg(test)]
pub(crate) mod testing;

// Re-export specific items to avoid ambiguous glob imports
pub use config::{AppConfig, ConfigError, ConfigManager, MadrigalConfig};
pub use device::{DeviceContext, DeviceError, UsbTransport};
pub use inputs::{InputChannel, InputGroup, InputType};
pub use mixer::{resolve_mutes, Channel, ChannelStrip, LevelDb, MixerBus, Pan};
pub use outputs::{
    LineLevel, LineLevelMismatch, LineOutput, MonitorLevelDb, MonitorOutput, MonitorStrip,
    OutputBank, SpeakerConfig,
};
pub use registers::{Control, DeviceModel};
