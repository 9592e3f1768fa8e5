use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::util::types::DeviceId;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read virtual device configuration: {0}")]
    Io(#[from] io::Error),

    #[error("invalid virtual device configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown generator '{0}'")]
    UnknownGenerator(String),

    #[error("generator '{generator}' requires min < max, got [{min}, {max}]")]
    InvalidRange {
        generator: String,
        min: f64,
        max: f64,
    },
}

/// Contents of the virtual devices configuration file
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct VdevConfig {
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    pub device_id: DeviceId,

    /// Polling period in seconds, 0 disables polling
    #[serde(default = "default_refresh_secs")]
    pub refresh: u64,

    #[serde(default)]
    pub paired: bool,

    #[serde(default)]
    pub vendor: String,

    #[serde(default)]
    pub product: String,

    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
}

fn default_refresh_secs() -> u64 {
    5
}

impl DeviceConfig {
    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModuleConfig {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
}

impl VdevConfig {
    /// Read the configuration from the given path.
    ///
    /// A missing file yields an empty configuration.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no virtual device configuration found");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }
}
