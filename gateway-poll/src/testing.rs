//! Test doubles shared by the unit tests of this crate
use async_trait::async_trait;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::data::{Distributor, SensorData, SensorValue};
use crate::device::{PollError, PollableDevice};
use crate::executor::{AsyncExecutor, Work};
use crate::refresh::RefreshTime;
use crate::util::types::{DeviceId, ModuleId};

pub struct TestDevice {
    id: DeviceId,
    refresh: Mutex<RefreshTime>,
    attempts: AtomicUsize,
    polled: AtomicUsize,
    fail_next: AtomicBool,
    fail_always: bool,
    panic: bool,
}

impl TestDevice {
    pub fn new(refresh: RefreshTime) -> Self {
        Self {
            id: DeviceId::random(),
            refresh: Mutex::new(refresh),
            attempts: AtomicUsize::new(0),
            polled: AtomicUsize::new(0),
            fail_next: AtomicBool::new(false),
            fail_always: false,
            panic: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail_always = true;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic = true;
        self
    }

    pub fn set_refresh(&self, refresh: RefreshTime) {
        *self.refresh.lock().unwrap() = refresh;
    }

    pub fn fail_next_poll(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Number of successful polls
    pub fn polled(&self) -> usize {
        self.polled.load(Ordering::SeqCst)
    }

    /// Number of poll calls, successful or not
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PollableDevice for TestDevice {
    fn id(&self) -> DeviceId {
        self.id
    }

    fn refresh(&self) -> RefreshTime {
        *self.refresh.lock().unwrap()
    }

    async fn poll(&self, sink: &dyn Distributor) -> Result<(), PollError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.panic {
            panic!("polling intentionally panicked");
        }

        if self.fail_always || self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(io::Error::other("polling intentionally failed").into());
        }

        self.polled.fetch_add(1, Ordering::SeqCst);
        sink.export_data(
            &SensorData::new(self.id).with_value(SensorValue::valid(ModuleId::new(0), 1.0)),
        );
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    exported: Mutex<Vec<SensorData>>,
}

impl RecordingSink {
    pub fn exported(&self) -> Vec<DeviceId> {
        self.exported
            .lock()
            .unwrap()
            .iter()
            .map(|data| data.device_id)
            .collect()
    }
}

impl Distributor for RecordingSink {
    fn export_data(&self, data: &SensorData) {
        self.exported.lock().unwrap().push(data.clone());
    }
}

/// Keeps work until explicitly run, which makes a dispatched poll stay
/// in flight for as long as a test needs.
#[derive(Default)]
pub struct QueueExecutor {
    queue: Mutex<Vec<Work>>,
}

impl QueueExecutor {
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn run_pending(&self) {
        let work: Vec<Work> = std::mem::take(&mut *self.queue.lock().unwrap());
        for unit in work {
            futures_lite::future::block_on(unit);
        }
    }
}

impl AsyncExecutor for QueueExecutor {
    fn invoke(&self, work: Work) {
        self.queue.lock().unwrap().push(work);
    }
}
