use async_trait::async_trait;
use std::io;
use thiserror::Error;

use crate::data::Distributor;
use crate::refresh::RefreshTime;
use crate::util::types::DeviceId;

#[derive(Debug, Error)]
pub enum PollError {
    #[error("device I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A device whose state has to be fetched periodically.
///
/// Devices are owned by their protocol manager, the poller only keeps
/// references to them while they are scheduled.
#[async_trait]
pub trait PollableDevice: Send + Sync {
    /// Stable identity of the device
    fn id(&self) -> DeviceId;

    /// The current polling cadence.
    ///
    /// This may change over time and is read again every time the device
    /// is (re)scheduled.
    fn refresh(&self) -> RefreshTime;

    /// Fetch the current state of the device once and export it to `sink`.
    ///
    /// This may take an arbitrary amount of time.
    async fn poll(&self, sink: &dyn Distributor) -> Result<(), PollError>;
}
