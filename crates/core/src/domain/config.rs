//! Configuration management for Madrigal
//!
//! This module provides:
//! - Application settings with TOML serialization
//! - A manager for the main config file with factory-default fallback

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, error, info, instrument};

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur during configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Device poll interval in milliseconds for watch mode
    pub poll_interval_ms: u64,

    /// Run against a simulated device instead of real hardware
    #[serde(default)]
    pub offline: bool,

    /// Include digital input channels in status output
    #[serde(default = "default_true")]
    pub show_digital_inputs: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            offline: false,
            show_digital_inputs: true,
        }
    }
}

/// Complete Madrigal configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MadrigalConfig {
    #[serde(default)]
    pub app: AppConfig,
}

impl MadrigalConfig {
    /// Load configuration from TOML file
    #[instrument(skip(path))]
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration");

        let contents = fs::read_to_string(path).await?;
        let config: Self = toml::from_str(&contents)?;

        if config.app.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Save configuration to TOML file
    #[instrument(skip(self, path))]
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        info!(path = %path.display(), "Saving configuration");

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        fs::write(path, toml_str).await?;

        debug!("Configuration saved successfully");
        Ok(())
    }
}

/// Configuration manager for the main Madrigal config
///
/// Manages the main configuration file at `~/.config/madrigal/config.toml`.
pub struct ConfigManager {
    config_dir: PathBuf,
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_path = config_dir.join("config.toml");

        Self {
            config_dir,
            config_path,
        }
    }

    /// Get the default config directory path
    ///
    /// Returns `~/.config/madrigal` on Linux/Mac
    /// Returns `%APPDATA%\madrigal` on Windows
    pub fn default_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("madrigal"))
            .ok_or_else(|| ConfigError::Invalid("Could not determine config directory".to_string()))
    }

    /// Get the config file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from file
    ///
    /// If the config file doesn't exist, returns the default and writes it
    /// out. If the config file is corrupt, backs it up, logs an error, and
    /// returns the default.
    #[instrument(skip(self))]
    pub async fn load(&self) -> MadrigalConfig {
        if !self.config_path.exists() {
            info!(
                path = %self.config_path.display(),
                "Config file not found, creating default"
            );

            let config = MadrigalConfig::default();

            if let Err(e) = config.save_to_file(&self.config_path).await {
                error!(
                    path = %self.config_path.display(),
                    error = %e,
                    "Failed to save default config"
                );
            }

            return config;
        }

        match MadrigalConfig::load_from_file(&self.config_path).await {
            Ok(config) => {
                info!(
                    path = %self.config_path.display(),
                    "Configuration loaded successfully"
                );
                config
            }
            Err(e) => {
                error!(
                    path = %self.config_path.display(),
                    error = %e,
                    "Failed to load config, using default"
                );

                // Backup the corrupt config
                let backup_path = self.config_path.with_extension("toml.corrupt");
                if let Err(copy_err) = fs::copy(&self.config_path, &backup_path).await {
                    error!(
                        path = %backup_path.display(),
                        error = %copy_err,
                        "Failed to backup corrupt config"
                    );
                }

                MadrigalConfig::default()
            }
        }
    }

    /// Save configuration to file
    #[instrument(skip(self, config))]
    pub async fn save(&self, config: &MadrigalConfig) -> Result<()> {
        fs::create_dir_all(&self.config_dir).await?;

        config.save_to_file(&self.config_path).await
    }
}
