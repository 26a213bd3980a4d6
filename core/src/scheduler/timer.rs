//! Tokio timer backed scheduler.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::runtime::Handle;

use super::{Scheduler, Task, TaskHandle};
use damage_numbers_types::MILLIS_PER_TICK;

/// Maps ticks onto wall-clock sleeps on a tokio runtime.
///
/// Task bodies run on runtime worker threads, so they may run concurrently
/// with each other and with event delivery.
pub struct TokioScheduler {
    runtime: Handle,
    tick: Duration,
    next_id: AtomicU64,
}

impl TokioScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self::with_tick(runtime, Duration::from_millis(MILLIS_PER_TICK))
    }

    /// Scheduler on the runtime of the calling context.
    ///
    /// Returns `None` outside a tokio runtime.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    pub fn with_tick(runtime: Handle, tick: Duration) -> Self {
        Self {
            runtime,
            tick,
            next_id: AtomicU64::new(0),
        }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay_ticks: u64, task: Task) -> TaskHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = TaskHandle::new(id);
        let guard = handle.clone();
        let delay = self.tick.saturating_mul(delay_ticks.min(u32::MAX as u64) as u32);

        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if guard.try_start() {
                task();
            }
        });

        handle
    }
}
