use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{ConfigError, VdevConfig};
use crate::device::VirtualDevice;
use crate::poll::{DevicePoller, PollableDevice, PollingKeeper, RefreshTime, ScheduleError};
use crate::util::types::DeviceId;

#[derive(Debug, Error)]
pub enum VdevError {
    #[error("virtual device {0} does not exist")]
    NotFound(DeviceId),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

#[derive(Default)]
struct State {
    devices: BTreeMap<DeviceId, Arc<VirtualDevice>>,
    paired: HashSet<DeviceId>,
    keeper: PollingKeeper,
}

impl State {
    fn device(&self, id: &DeviceId) -> Result<Arc<VirtualDevice>, VdevError> {
        self.devices
            .get(id)
            .cloned()
            .ok_or(VdevError::NotFound(*id))
    }

    /// Poll the device if it is paired and wants to be polled, stop
    /// polling it otherwise
    fn sync_polling(&mut self, device: Arc<VirtualDevice>) -> Result<(), ScheduleError> {
        let id = device.id();
        if !self.paired.contains(&id) || device.refresh().time().is_none() {
            self.keeper.cancel(&id);
            return Ok(());
        }

        self.keeper.schedule(device)
    }
}

/// Owner of the virtual devices.
///
/// Paired devices with a polling period are polled through the shared
/// [`DevicePoller`]. Everything this manager scheduled is cancelled when
/// it is stopped or dropped.
pub struct VirtualDeviceManager {
    state: Mutex<State>,
}

impl VirtualDeviceManager {
    pub fn new(poller: DevicePoller) -> Self {
        Self {
            state: Mutex::new(State {
                keeper: PollingKeeper::with_poller(poller),
                ..State::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read the configuration at `path` and register its devices
    pub async fn load_file(&self, path: impl AsRef<Path>) -> Result<usize, VdevError> {
        let config = VdevConfig::load(path).await?;
        Ok(self.load(config))
    }

    /// Register the configured devices, returning how many were added.
    ///
    /// Invalid devices and duplicates are skipped.
    pub fn load(&self, config: VdevConfig) -> usize {
        let mut state = self.state();
        let mut loaded = 0;

        for device in config.devices {
            let id = device.device_id;
            if state.devices.contains_key(&id) {
                warn!(device = %id, "virtual device already registered, skipping");
                continue;
            }

            match VirtualDevice::from_config(&device) {
                Ok(vdev) => {
                    debug!(device = %id, refresh = %vdev.refresh(), "registered virtual device");
                    if device.paired {
                        state.paired.insert(id);
                    }
                    state.devices.insert(id, Arc::new(vdev));
                    loaded += 1;
                }
                Err(e) => error!(device = %id, "invalid virtual device: {e}"),
            }
        }

        loaded
    }

    /// Start polling all paired devices, returning how many were scheduled
    #[instrument(name = "vdev", skip_all)]
    pub fn start(&self) -> usize {
        let mut state = self.state();
        let devices: Vec<_> = state.devices.values().cloned().collect();

        let mut scheduled = 0;
        for device in devices {
            let id = device.id();
            match state.sync_polling(device) {
                Ok(()) if state.keeper.lookup(&id).is_some() => scheduled += 1,
                Ok(()) => {}
                Err(e) => warn!(device = %id, "failed to schedule virtual device: {e}"),
            }
        }

        info!("polling {scheduled} of {} virtual devices", state.devices.len());
        scheduled
    }

    /// Pair the device and start polling it
    pub fn accept(&self, id: &DeviceId) -> Result<(), VdevError> {
        let mut state = self.state();
        let device = state.device(id)?;

        if state.paired.insert(*id) {
            info!(device = %id, "virtual device paired");
        }
        state.sync_polling(device)?;
        Ok(())
    }

    /// Unpair the device and stop polling it
    pub fn unpair(&self, id: &DeviceId) -> Result<(), VdevError> {
        let mut state = self.state();
        state.device(id)?;

        if state.paired.remove(id) {
            info!(device = %id, "virtual device unpaired");
        } else {
            warn!(device = %id, "virtual device is not paired");
        }
        state.keeper.cancel(id);
        Ok(())
    }

    /// Change the polling period of the device.
    ///
    /// A paired device is scheduled or cancelled to follow the new value.
    /// A device already being polled gets a deadline computed from the new
    /// period instead of waiting out the old one.
    pub fn set_refresh(&self, id: &DeviceId, refresh: RefreshTime) -> Result<(), VdevError> {
        let mut state = self.state();
        let device = state.device(id)?;

        device.set_refresh(refresh);
        state.keeper.cancel(id);
        state.sync_polling(device)?;
        Ok(())
    }

    /// Stop polling every device of this manager
    pub fn stop(&self) {
        self.state().keeper.cancel_all();
    }

    pub fn paired(&self, id: &DeviceId) -> bool {
        self.state().paired.contains(id)
    }

    pub fn polled(&self, id: &DeviceId) -> bool {
        self.state().keeper.lookup(id).is_some()
    }

    pub fn devices(&self) -> Vec<Arc<VirtualDevice>> {
        self.state().devices.values().cloned().collect()
    }
}
