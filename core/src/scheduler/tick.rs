//! Host-tick driven scheduler.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use super::{Scheduler, Task, TaskHandle};

/// Runs tasks when the host advances time.
///
/// A task scheduled at tick `t` with delay `d` runs during the `advance()`
/// call that processes tick `t + d`. Tasks of one tick run in scheduling
/// order, one at a time. Tasks scheduled while a tick is being processed run
/// no earlier than the next tick.
#[derive(Default)]
pub struct TickScheduler {
    current_tick: AtomicU64,
    next_seq: AtomicU64,
    queue: Mutex<BTreeMap<(u64, u64), (TaskHandle, Task)>>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick.load(Ordering::SeqCst)
    }

    /// Process the current tick, then move to the next one.
    /// Returns the number of task bodies that ran.
    pub fn advance(&self) -> usize {
        let tick = self.current_tick();
        let due = {
            let mut queue = self.queue.lock();
            let later = queue.split_off(&(tick + 1, 0));
            std::mem::replace(&mut *queue, later)
        };

        let mut ran = 0;
        for (_, (handle, task)) in due {
            if handle.try_start() {
                task();
                ran += 1;
            }
        }

        self.current_tick.fetch_add(1, Ordering::SeqCst);
        ran
    }

    /// Advance `ticks` times. Returns the total number of task bodies run.
    pub fn advance_by(&self, ticks: u64) -> usize {
        (0..ticks).map(|_| self.advance()).sum()
    }

    /// Advance until nothing is queued, up to `max_ticks`.
    pub fn run_until_idle(&self, max_ticks: u64) -> usize {
        let mut ran = 0;
        for _ in 0..max_ticks {
            if self.pending_count() == 0 {
                break;
            }
            ran += self.advance();
        }
        ran
    }

    /// Queued tasks that have not been cancelled.
    pub fn pending_count(&self) -> usize {
        self.queue
            .lock()
            .values()
            .filter(|(handle, _)| handle.is_pending())
            .count()
    }
}

impl Scheduler for TickScheduler {
    fn schedule(&self, delay_ticks: u64, task: Task) -> TaskHandle {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let handle = TaskHandle::new(seq);
        let due = self.current_tick().saturating_add(delay_ticks);
        self.queue.lock().insert((due, seq), (handle.clone(), task));
        handle
    }
}
