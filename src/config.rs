//! # Configuration
//!
//! One TOML file, every section optional. A missing default file degrades to
//! built-in defaults so the emulator still starts on a fresh device; a path
//! given explicitly on the command line has to exist.
//!
//! ```toml
//! layout = "custom"          # or "extended"
//!
//! [serial]                   # used by `call`
//! baud_rate = 12000000
//! read_timeout_ms = 3000
//!
//! [server]
//! max_line_length = 65536
//!
//! [sink]
//! kind = "hidg"              # or "log"
//! path = "/dev/hidg0"
//!
//! [device]
//! vendor_id = 0x2786
//! product_id = 0x000a
//! manufacturer = "Switch Science"
//! product = "Gamepad Emulator"
//! ```

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::gamepad::{LayoutKind, SinkConfig};
use crate::rpc::server::DEFAULT_MAX_LINE_LENGTH;
use crate::rpc::SerialConfig;

const CONFIG_DIR: &str = "gamepad-emulator";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Descriptor variant, fixed for the lifetime of the process
    pub layout: LayoutKind,
    pub serial: SerialConfig,
    pub server: ServerConfig,
    pub sink: SinkConfig,
    pub device: DeviceIdentity,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub max_line_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

/// USB identity the gadget should advertise next to the report descriptor
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
    pub manufacturer: String,
    pub product: String,
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self {
            vendor_id: 0x2786,
            product_id: 0x000a,
            manufacturer: "Switch Science".to_string(),
            product: "Gamepad Emulator".to_string(),
        }
    }
}

impl Config {
    /// `<config_dir>/gamepad-emulator/config.toml`
    pub fn default_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            warn!("Could not determine config directory, using current directory");
            PathBuf::from(".")
        });
        base.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path).await;
        }

        let path = Self::default_path();
        match tokio::fs::try_exists(&path).await {
            Ok(true) => Self::from_file(&path).await,
            Ok(false) => {
                warn!("No config file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => {
                warn!("Unable to check {}: {}, using defaults", path.display(), e);
                Ok(Self::default())
            }
        }
    }

    pub async fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }
}
