//! Configuration for the ensemble tools
//!
//! Loaded from a TOML file; every section and key is optional.
//!
//! # Example
//! ```toml
//! [decoder]
//! checksum_policy = "discard"
//! max_data_sets = 20
//!
//! [emulator]
//! num_bins = 50
//! num_beams = 4
//! bin_size = 0.5
//! seed = 7
//! include_nmea = true
//! ```

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::common::framing::MAX_NUM_DATA_SETS;
use crate::ensemble::{ChecksumPolicy, DecodeOptions};
use crate::ensemble_emulator::EmulatorConfig;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub decoder: DecoderConfig,
    #[serde(default)]
    pub emulator: EmulatorConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.decoder.max_data_sets == 0 {
            return Err(ConfigError::InvalidValue {
                field: "decoder.max_data_sets",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.emulator.num_beams == 0 || self.emulator.num_beams > crate::common::MAX_BEAMS {
            return Err(ConfigError::InvalidValue {
                field: "emulator.num_beams",
                reason: format!("must be 1-{}", crate::common::MAX_BEAMS),
            });
        }
        Ok(())
    }
}

/// `[decoder]` section
#[derive(Debug, Clone, Deserialize)]
pub struct DecoderConfig {
    #[serde(default)]
    pub checksum_policy: ChecksumPolicy,

    #[serde(default = "default_max_data_sets")]
    pub max_data_sets: usize,
}

fn default_max_data_sets() -> usize {
    MAX_NUM_DATA_SETS
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            checksum_policy: ChecksumPolicy::default(),
            max_data_sets: default_max_data_sets(),
        }
    }
}

impl DecoderConfig {
    pub fn to_decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            checksum_policy: self.checksum_policy,
            max_data_sets: self.max_data_sets,
        }
    }
}
