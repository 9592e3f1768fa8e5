use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::util::types::{DeviceId, ModuleId};

/// A single reading of one device module.
///
/// A `None` value marks a reading the module could not provide.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SensorValue {
    pub module: ModuleId,
    pub value: Option<f64>,
}

impl SensorValue {
    pub fn valid(module: ModuleId, value: f64) -> Self {
        Self {
            module,
            value: Some(value),
        }
    }

    pub fn invalid(module: ModuleId) -> Self {
        Self {
            module,
            value: None,
        }
    }
}

/// Output of one poll of a device
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SensorData {
    pub device_id: DeviceId,
    pub timestamp: SystemTime,
    pub values: Vec<SensorValue>,
}

impl SensorData {
    pub fn new(device_id: DeviceId) -> Self {
        Self {
            device_id,
            timestamp: SystemTime::now(),
            values: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: SensorValue) -> Self {
        self.values.push(value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Sink for data produced by device polls.
///
/// Exporting is fire and forget: delivery problems are the sink's own
/// concern and never reach the caller.
pub trait Distributor: Send + Sync {
    fn export_data(&self, data: &SensorData);
}
