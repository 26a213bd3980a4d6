//! Delayed, cancellable tasks
//!
//! "Run this after N ticks" is the only suspension primitive the engine uses.
//! Every scheduled task gets a [`TaskHandle`]; cancelling it is effective only
//! if the task has not started yet, and the return value says which case won.
//!
//! Two backends:
//! - [`TickScheduler`]: driven by the host calling `advance()` once per tick.
//! - [`TokioScheduler`]: tokio timers on a runtime handle.

mod tick;
mod timer;

pub use self::tick::TickScheduler;
pub use self::timer::TokioScheduler;

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Schedules tasks in host ticks.
///
/// Implementations must never run a task inline from `schedule`: callers may
/// hold locks that the task itself takes.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay_ticks: u64, task: Task) -> TaskHandle;
}

const PENDING: u8 = 0;
const CANCELLED: u8 = 1;
const STARTED: u8 = 2;

/// Shared state of one scheduled task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: u64,
    state: Arc<AtomicU8>,
}

impl TaskHandle {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            state: Arc::new(AtomicU8::new(PENDING)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Prevent the task from running. Returns `true` iff this call won
    /// against dispatch; `false` means it already started (or was cancelled).
    pub fn cancel(&self) -> bool {
        self.state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_pending(&self) -> bool {
        self.state.load(Ordering::Acquire) == PENDING
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }

    /// Claim the task for execution. Backends call this right before running
    /// the task body and skip it on `false`.
    pub(crate) fn try_start(&self) -> bool {
        self.state
            .compare_exchange(PENDING, STARTED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
