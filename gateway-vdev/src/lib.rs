/*
Virtual devices: configurable devices producing synthetic sensor data.

They are polled like any other device through the shared device poller,
which makes them useful for testing a gateway without real hardware.
*/

mod config;
mod device;
mod generator;
mod manager;

pub use config::{ConfigError, DeviceConfig, ModuleConfig, VdevConfig};
pub use device::{VirtualDevice, VirtualModule};
pub use generator::Generator;
pub use manager::{VdevError, VirtualDeviceManager};

use gateway_poll as poll;
use gateway_util as util;
