use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tracing::trace;

/// A unit of work handed to an [`AsyncExecutor`]
pub type Work = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Runs units of work decoupled from the caller.
///
/// The caller never observes the outcome of the work.
pub trait AsyncExecutor: Send + Sync {
    fn invoke(&self, work: Work);
}

/// Runs every unit of work on a tokio runtime, with at most `concurrency`
/// units in progress at any given time. Extra units wait for a free slot.
#[derive(Clone, Debug)]
pub struct ParallelExecutor {
    handle: Handle,
    slots: Arc<Semaphore>,
}

impl ParallelExecutor {
    /// Create an executor on the runtime of the current context.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn new(concurrency: usize) -> Self {
        Self::with_handle(Handle::current(), concurrency)
    }

    pub fn with_handle(handle: Handle, concurrency: usize) -> Self {
        Self {
            handle,
            slots: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Number of slots currently not taken by running work
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }
}

impl AsyncExecutor for ParallelExecutor {
    fn invoke(&self, work: Work) {
        let slots = Arc::clone(&self.slots);
        self.handle.spawn(async move {
            match slots.acquire_owned().await {
                Ok(_slot) => work.await,
                // the semaphore is never closed while the executor lives
                Err(_) => trace!("executor closed, dropping work"),
            }
        });
    }
}

/// Runs every unit of work to completion on the calling thread.
///
/// Work must not depend on the tokio reactor (timers, sockets), as it is
/// driven outside of it.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl AsyncExecutor for InlineExecutor {
    fn invoke(&self, work: Work) {
        futures_lite::future::block_on(work);
    }
}
