//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables
//! - CLI arguments (for the `mas-client` binary)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{MasError, Result};

/// Largest OBEX packet the client offers on CONNECT.
pub const MAX_CLIENT_PACKET_SIZE: usize = 0xFC00;

/// Default name of the session worker thread.
pub const DEFAULT_THREAD_NAME: &str = "MAS ClientThread";

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Session worker configuration
    #[serde(default)]
    pub session: SessionConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| MasError::Config(format!("Failed to read config file: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| MasError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(mps) = std::env::var("MAS_MAX_PACKET_SIZE") {
            if let Ok(mps) = mps.parse() {
                config.session.max_packet_size = mps;
            }
        }
        if let Ok(name) = std::env::var("MAS_THREAD_NAME") {
            config.session.thread_name = name;
        }
        if let Ok(srm) = std::env::var("MAS_SRM") {
            if let Some(srm) = parse_bool(&srm) {
                config.session.srm = srm;
            }
        }

        config
    }

    /// Default config file location (`<config dir>/mas-client/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mas-client").join("config.toml"))
    }

    /// Merge with another config (other takes precedence)
    pub fn merge(self, other: Self) -> Self {
        let defaults = SessionConfig::default();
        Self {
            session: SessionConfig {
                max_packet_size: if other.session.max_packet_size != defaults.max_packet_size {
                    other.session.max_packet_size
                } else {
                    self.session.max_packet_size
                },
                thread_name: if other.session.thread_name != defaults.thread_name {
                    other.session.thread_name
                } else {
                    self.session.thread_name
                },
                srm: if other.session.srm != defaults.srm {
                    other.session.srm
                } else {
                    self.session.srm
                },
            },
        }
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Session worker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum OBEX packet size offered on CONNECT (capped by the transport)
    pub max_packet_size: usize,

    /// Worker thread name
    pub thread_name: String,

    /// Allow single response mode on capable transports
    pub srm: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_packet_size: MAX_CLIENT_PACKET_SIZE,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            srm: true,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
