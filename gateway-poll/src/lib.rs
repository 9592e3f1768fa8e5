/*
This crate is home to the device polling scheduler shared by every
polling-based protocol manager of the gateway.

Protocol managers hand their devices to a `PollingKeeper`, which forwards
them to a (usually shared) `DevicePoller`. The poller keeps a single
time-ordered schedule, dispatches due polls through an `AsyncExecutor` and
re-inserts each device relative to the completion of its last poll.
*/

mod config;
mod data;
mod device;
mod executor;
mod keeper;
mod poller;
mod refresh;
mod stop;

#[cfg(test)]
mod testing;

pub use config::PollerConfig;
pub use data::{Distributor, SensorData, SensorValue};
pub use device::{PollError, PollableDevice};
pub use executor::{AsyncExecutor, InlineExecutor, ParallelExecutor, Work};
pub use keeper::PollingKeeper;
pub use poller::{DevicePoller, ScheduleError};
pub use refresh::RefreshTime;
pub use stop::{Run, StopControl};

use gateway_util as util;
