use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::util::json::{deserialize_delta_from_ms, serialize_delta_to_ms};

/// Tunables of a [`DevicePoller`](crate::DevicePoller)
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PollerConfig {
    /// Warn when a poll takes longer than the device refresh time plus
    /// this threshold. May be negative to catch devices that poll for
    /// almost as long as their refresh time.
    #[serde(
        rename = "warn_threshold_ms",
        deserialize_with = "deserialize_delta_from_ms",
        serialize_with = "serialize_delta_to_ms"
    )]
    pub warn_threshold: TimeDelta,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            warn_threshold: TimeDelta::seconds(1),
        }
    }
}
