use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

/// Cooperative stop flag with an interruptible wait.
///
/// A wakeup requested while nobody is waiting is remembered, so the next
/// call to [`StopControl::wait_stoppable`] returns immediately. This allows
/// a loop to release its locks before waiting without missing a wakeup
/// issued in between.
#[derive(Debug, Default)]
pub struct StopControl {
    stop: AtomicBool,
    wakeup: Notify,
}

impl StopControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the guarded loop to terminate and wake it up
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        self.wakeup.notify_one();
    }

    /// Interrupt the current (or next) wait without stopping
    pub fn request_wakeup(&self) {
        self.wakeup.notify_one();
    }

    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Wait until woken up, stopped or until `timeout` elapses. A `None`
    /// timeout waits without limit.
    ///
    /// Returns whether a stop has been requested.
    pub async fn wait_stoppable(&self, timeout: Option<Duration>) -> bool {
        if self.should_stop() {
            return true;
        }

        match timeout {
            Some(timeout) => {
                let _ = tokio::time::timeout(timeout, self.wakeup.notified()).await;
            }
            None => self.wakeup.notified().await,
        }

        self.should_stop()
    }

    /// Guard a loop running until stopped.
    ///
    /// The control is re-armed when the guard is dropped, so the loop
    /// can be started again afterwards.
    pub fn run(&self) -> Run<'_> {
        Run { control: self }
    }
}

/// Guard returned by [`StopControl::run`]
#[derive(Debug)]
pub struct Run<'a> {
    control: &'a StopControl,
}

impl Run<'_> {
    /// Whether the guarded loop should keep going
    pub fn running(&self) -> bool {
        !self.control.should_stop()
    }
}

impl Drop for Run<'_> {
    fn drop(&mut self) {
        self.control.stop.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_without_wakeup() {
        let control = StopControl::new();
        let start = Instant::now();

        let stopped = control.wait_stoppable(Some(Duration::from_secs(3))).await;

        assert!(!stopped);
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wakeup_before_wait_is_not_lost() {
        let control = StopControl::new();
        let start = Instant::now();

        control.request_wakeup();
        let stopped = control.wait_stoppable(Some(Duration::from_secs(60))).await;

        assert!(!stopped);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_interrupts_an_unbounded_wait() {
        let control = Arc::new(StopControl::new());

        let waiter = {
            let control = Arc::clone(&control);
            tokio::spawn(async move { control.wait_stoppable(None).await })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        control.request_stop();

        assert!(waiter.await.unwrap());
    }

    #[test]
    fn test_run_guard_rearms_on_drop() {
        let control = StopControl::new();
        {
            let run = control.run();
            assert!(run.running());
            control.request_stop();
            assert!(!run.running());
        }
        assert!(!control.should_stop());
        assert!(control.run().running());
    }
}
