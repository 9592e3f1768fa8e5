use std::collections::{BTreeMap, HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::TimeDelta;
use futures_lite::FutureExt;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::config::PollerConfig;
use crate::data::Distributor;
use crate::device::PollableDevice;
use crate::executor::AsyncExecutor;
use crate::refresh::RefreshTime;
use crate::stop::StopControl;
use crate::util::types::DeviceId;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("device {id} is not pollable due to its refresh settings ({refresh})")]
    NotPollable { id: DeviceId, refresh: RefreshTime },

    #[error("no device poller configured")]
    Unbound,
}

// Entries sharing a deadline are ordered by insertion
type Slot = (Instant, u64);

struct State {
    executor: Option<Arc<dyn AsyncExecutor>>,
    warn_threshold: TimeDelta,
    schedule: BTreeMap<Slot, Arc<dyn PollableDevice>>,
    devices: HashMap<DeviceId, Slot>,
    active: HashSet<DeviceId>,
    seq: u64,
}

impl State {
    /// Insert the device into the schedule at `now` plus its current
    /// refresh time, replacing any previous entry of the same device.
    fn insert(
        &mut self,
        device: Arc<dyn PollableDevice>,
        now: Instant,
    ) -> Result<Instant, ScheduleError> {
        let refresh = grab_refresh(device.as_ref())?;
        let slot = (now + refresh, self.seq);
        self.seq += 1;

        let id = device.id();
        self.schedule.insert(slot, device);
        if let Some(previous) = self.devices.insert(id, slot) {
            self.schedule.remove(&previous);
        }

        Ok(slot.0)
    }
}

struct Inner {
    distributor: Arc<dyn Distributor>,
    state: Mutex<State>,
    stop_control: StopControl,
}

/// Scheduler for [`PollableDevice`] instances.
///
/// Any number of devices can be scheduled for regular polling according to
/// their refresh time and later cancelled. A single loop ([`DevicePoller::run`])
/// waits for the earliest deadline and hands due polls to the configured
/// [`AsyncExecutor`], so a slow device never blocks the schedule. Once a poll
/// completes, the device is scheduled again relative to the completion time.
///
/// The poller is a handle, clones share the same schedule.
#[derive(Clone)]
pub struct DevicePoller {
    inner: Arc<Inner>,
}

impl DevicePoller {
    pub fn new(distributor: Arc<dyn Distributor>, executor: Arc<dyn AsyncExecutor>) -> Self {
        Self {
            inner: Arc::new(Inner {
                distributor,
                state: Mutex::new(State {
                    executor: Some(executor),
                    warn_threshold: PollerConfig::default().warn_threshold,
                    schedule: BTreeMap::new(),
                    devices: HashMap::new(),
                    active: HashSet::new(),
                    seq: 0,
                }),
                stop_control: StopControl::new(),
            }),
        }
    }

    pub fn with_config(self, config: PollerConfig) -> Self {
        self.set_warn_threshold(config.warn_threshold);
        self
    }

    pub fn set_poll_executor(&self, executor: Arc<dyn AsyncExecutor>) {
        self.state().executor = Some(executor);
    }

    /// Configure how much longer than its refresh time a poll may take
    /// before a warning is logged. The threshold may be negative.
    pub fn set_warn_threshold(&self, threshold: TimeDelta) {
        self.state().warn_threshold = threshold;
    }

    /// Whether both handles refer to the same poller
    pub fn ptr_eq(&self, other: &DevicePoller) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Schedule the device for polling relative to the current time.
    ///
    /// See [`DevicePoller::schedule_at`].
    pub fn schedule(&self, device: Arc<dyn PollableDevice>) -> Result<(), ScheduleError> {
        self.schedule_at(device, Instant::now())
    }

    /// Schedule the device to be polled one refresh time after `now`.
    ///
    /// A device that is already scheduled or being polled is left untouched.
    /// Fails if the device refresh time is not usable for polling, in which
    /// case the device is not scheduled.
    pub fn schedule_at(
        &self,
        device: Arc<dyn PollableDevice>,
        now: Instant,
    ) -> Result<(), ScheduleError> {
        let id = device.id();
        {
            let mut state = self.state();
            if state.active.contains(&id) || state.devices.contains_key(&id) {
                trace!(device = %id, "device is already scheduled");
                return Ok(());
            }

            state.insert(device, now)?;
        }

        // the loop may be sleeping towards a later deadline
        self.inner.stop_control.request_wakeup();
        debug!(device = %id, "scheduled device for polling");

        Ok(())
    }

    /// Cancel polling of the device with the given id, if any.
    ///
    /// A poll already in progress is not interrupted, but the device will
    /// not be scheduled again once it completes.
    pub fn cancel(&self, id: &DeviceId) {
        let mut state = self.state();

        state.active.remove(id);

        if let Some(slot) = state.devices.remove(id) {
            state.schedule.remove(&slot);
            debug!(device = %id, "cancelled device from polling");
        }
    }

    /// Schedule a device again after its poll completed at `now`.
    ///
    /// Only devices still marked active are considered, a device cancelled
    /// while being polled is thus dropped here. A device that became
    /// unpollable in the meantime is dropped as well.
    pub(crate) fn reschedule_at(&self, device: Arc<dyn PollableDevice>, now: Instant) {
        let id = device.id();
        {
            let mut state = self.state();
            if !state.active.remove(&id) {
                return;
            }

            if let Err(err) = state.insert(device, now) {
                warn!(device = %id, "{err}, dropping it from polling");
                return;
            }
        }

        self.inner.stop_control.request_wakeup();
        debug!(device = %id, "rescheduled device for polling");
    }

    /// Check the earliest entry of the schedule.
    ///
    /// If it is due at `now`, the device is marked active and handed to
    /// the executor and a zero duration is returned. Otherwise return the
    /// time left until it is due. Returns `None` if nothing is scheduled.
    pub fn poll_next_if_on_schedule(&self, now: Instant) -> Option<Duration> {
        let device = {
            let mut state = self.state();

            let (&(deadline, _), _) = state.schedule.first_key_value()?;
            if deadline > now {
                return Some(deadline - now);
            }

            let (_, device) = state.schedule.pop_first()?;
            let id = device.id();
            state.devices.remove(&id);
            state.active.insert(id);
            device
        };

        self.do_poll(device);
        Some(Duration::ZERO)
    }

    /// Hand a poll of the device to the configured executor
    pub(crate) fn do_poll(&self, device: Arc<dyn PollableDevice>) {
        let (executor, warn_threshold) = {
            let state = self.state();
            (state.executor.clone(), state.warn_threshold)
        };

        let Some(executor) = executor else {
            error!(
                device = %device.id(),
                "no poll executor configured, dropping device from polling"
            );
            self.state().active.remove(&device.id());
            return;
        };

        let poller = self.clone();
        executor.invoke(Box::pin(async move {
            poller.poll_device(device, warn_threshold).await
        }));
    }

    async fn poll_device(&self, device: Arc<dyn PollableDevice>, warn_threshold: TimeDelta) {
        let id = device.id();
        let started = Instant::now();
        debug!(device = %id, "polling device");

        let sink = Arc::clone(&self.inner.distributor);
        match AssertUnwindSafe(device.poll(sink.as_ref()))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => trace!(device = %id, "poll finished"),
            Ok(Err(err)) => error!(device = %id, "poll failed: {err}"),
            Err(_) => error!(device = %id, "poll panicked"),
        }

        let elapsed = started.elapsed();
        if let Some(refresh) = device.refresh().time()
            && is_too_slow(elapsed, refresh, warn_threshold)
        {
            warn!(
                device = %id,
                "polling took too long ({elapsed:?}) with respect to refresh time ({refresh:?})"
            );
        }

        self.reschedule_at(device, Instant::now());
    }

    /// Poll devices according to the schedule until stopped
    #[instrument(name = "poller", skip_all)]
    pub async fn run(&self) {
        let control = &self.inner.stop_control;
        let run = control.run();

        info!("device poller is starting");

        while run.running() {
            match self.poll_next_if_on_schedule(Instant::now()) {
                None => {
                    if self.active_len() > 0 {
                        debug!("all devices are active, sleeping");
                    } else {
                        debug!("no device to poll, sleeping");
                    }
                    control.wait_stoppable(None).await;
                }
                Some(sleep) if !sleep.is_zero() => {
                    trace!("no device to poll now, sleeping for at least {sleep:?}");
                    control.wait_stoppable(Some(sleep)).await;
                }
                // a device was dispatched, look for more due devices
                Some(_) => {}
            }
        }

        info!("device poller has stopped");
    }

    /// Request the polling loop to terminate
    pub fn stop(&self) {
        self.inner.stop_control.request_stop();
    }

    /// Forget all scheduled and active devices and detach the executor
    pub fn cleanup(&self) {
        let mut state = self.state();

        state.active.clear();
        state.devices.clear();
        state.schedule.clear();
        state.executor = None;
    }

    pub fn is_scheduled(&self, id: &DeviceId) -> bool {
        self.state().devices.contains_key(id)
    }

    pub fn is_active(&self, id: &DeviceId) -> bool {
        self.state().active.contains(id)
    }

    /// The point in time the device is next due, if it is scheduled
    pub fn deadline(&self, id: &DeviceId) -> Option<Instant> {
        self.state().devices.get(id).map(|(deadline, _)| *deadline)
    }

    pub fn scheduled_len(&self) -> usize {
        self.state().schedule.len()
    }

    pub fn active_len(&self) -> usize {
        self.state().active.len()
    }
}

/// Return the refresh time of a device if it can be used for polling
pub(crate) fn grab_refresh(device: &dyn PollableDevice) -> Result<Duration, ScheduleError> {
    let refresh = device.refresh();
    refresh.time().ok_or(ScheduleError::NotPollable {
        id: device.id(),
        refresh,
    })
}

fn is_too_slow(elapsed: Duration, refresh: Duration, threshold: TimeDelta) -> bool {
    let (Ok(elapsed), Ok(refresh)) = (TimeDelta::from_std(elapsed), TimeDelta::from_std(refresh))
    else {
        return false;
    };

    elapsed
        .checked_sub(&refresh)
        .is_some_and(|diff| diff > threshold)
}
