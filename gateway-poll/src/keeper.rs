use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::device::PollableDevice;
use crate::poller::{DevicePoller, ScheduleError};
use crate::util::types::DeviceId;

/// Keeps track of the devices an owner scheduled into a (possibly shared)
/// [`DevicePoller`], so that none of them is left behind.
///
/// All registered devices are cancelled by [`PollingKeeper::cancel_all`] or
/// when the keeper is dropped. The keeper is not synchronized, its owner is
/// expected to serialize access to it.
#[derive(Default)]
pub struct PollingKeeper {
    poller: Option<DevicePoller>,
    polled: HashMap<DeviceId, Arc<dyn PollableDevice>>,
}

impl PollingKeeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poller(poller: DevicePoller) -> Self {
        Self {
            poller: Some(poller),
            polled: HashMap::new(),
        }
    }

    /// Configure the poller to use.
    ///
    /// Devices registered with a different poller are cancelled first.
    pub fn set_device_poller(&mut self, poller: DevicePoller) {
        if let Some(current) = &self.poller
            && !current.ptr_eq(&poller)
        {
            if !self.polled.is_empty() {
                warn!(
                    "switching device poller, cancelling {} devices",
                    self.polled.len()
                );
            }
            self.cancel_all();
        }

        self.poller = Some(poller);
    }

    /// Register the device and schedule it into the underlying poller.
    ///
    /// The device is only registered if the poller accepted it.
    pub fn schedule(&mut self, device: Arc<dyn PollableDevice>) -> Result<(), ScheduleError> {
        let poller = self.poller.as_ref().ok_or(ScheduleError::Unbound)?;
        poller.schedule(Arc::clone(&device))?;

        self.polled.insert(device.id(), device);
        Ok(())
    }

    /// Cancel polling of the device and unregister it
    pub fn cancel(&mut self, id: &DeviceId) {
        if let Some(poller) = &self.poller {
            poller.cancel(id);
        }
        self.polled.remove(id);
    }

    /// Cancel all registered devices
    pub fn cancel_all(&mut self) {
        if let Some(poller) = &self.poller {
            for id in self.polled.keys() {
                poller.cancel(id);
            }
        }

        if !self.polled.is_empty() {
            debug!("cancelled {} polled devices", self.polled.len());
        }
        self.polled.clear();
    }

    /// Find a device previously scheduled through this keeper
    pub fn lookup(&self, id: &DeviceId) -> Option<Arc<dyn PollableDevice>> {
        self.polled.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.polled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polled.is_empty()
    }
}

impl Drop for PollingKeeper {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
