//! Aggregation windows
//!
//! A [`Stacker`] coalesces bursts of events for one key into a single delayed
//! emission. Every `record` pushes the emission back by the configured delay;
//! the emission fires once the key has been quiet for that long.
//!
//! Locking: the key map lock is only held to look up, insert or remove an
//! entry. All accumulator updates, cancellation and rescheduling happen under
//! the entry's own lock, and the firing task takes that same lock before it
//! reads the accumulator. A task that already started when `record` tried to
//! cancel it finds a newer generation and does nothing, so each burst is
//! emitted exactly once with its complete sum.


use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use hashbrown::HashMap;
use parking_lot::Mutex;

use damage_numbers_types::MILLIS_PER_TICK;

use crate::scheduler::{Scheduler, TaskHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackWindow {
    /// Events closer than this to the previous one join its stack.
    pub window_ms: u64,
    /// Quiet time after the last event before the stack is emitted.
    pub delay_ticks: u64,
}

impl StackWindow {
    pub fn new(window_ms: u64, delay_ticks: u64) -> Self {
        Self {
            window_ms,
            delay_ticks,
        }
    }

    /// True when the emission can fire after the window already closed, in
    /// which case late events start a new stack instead of joining.
    pub fn delay_exceeds_window(&self) -> bool {
        self.delay_ticks.saturating_mul(MILLIS_PER_TICK) > self.window_ms
    }
}

/// The result of one burst.
#[derive(Debug, Clone, PartialEq)]
pub struct Emission<P> {
    pub amount: f64,
    /// Any event of the burst was critical.
    pub critical: bool,
    pub events: u32,
    /// Payload of the most recent event.
    pub payload: P,
}

/// What a `record` call did to its key's stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recorded {
    pub accumulated: f64,
    /// The event started a new stack.
    pub started: bool,
}

pub type EmitFn<K, P> = Arc<dyn Fn(K, Emission<P>) + Send + Sync>;

struct PendingStack<P> {
    accumulated: f64,
    critical: bool,
    events: u32,
    last_update_ms: Option<u64>,
    payload: Option<P>,
    handle: Option<TaskHandle>,
    generation: u64,
    /// Emitted or abandoned; the entry is no longer in the map.
    retired: bool,
}

impl<P> Default for PendingStack<P> {
    fn default() -> Self {
        Self {
            accumulated: 0.0,
            critical: false,
            events: 0,
            last_update_ms: None,
            payload: None,
            handle: None,
            generation: 0,
            retired: false,
        }
    }
}

type Entry<P> = Arc<Mutex<PendingStack<P>>>;

struct Inner<K, P> {
    window: StackWindow,
    scheduler: Arc<dyn Scheduler>,
    emit: EmitFn<K, P>,
    entries: Mutex<HashMap<K, Entry<P>>>,
    closed: AtomicBool,
}

/// Keyed aggregation window. Cheap to clone; clones share state.
pub struct Stacker<K, P> {
    inner: Arc<Inner<K, P>>,
}

impl<K, P> Clone for Stacker<K, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, P> Stacker<K, P>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    P: Send + 'static,
{
    pub fn new(window: StackWindow, scheduler: Arc<dyn Scheduler>, emit: EmitFn<K, P>) -> Self {
        Self {
            inner: Arc::new(Inner {
                window,
                scheduler,
                emit,
                entries: Mutex::new(HashMap::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn window(&self) -> StackWindow {
        self.inner.window
    }

    /// Add one event to `key`'s stack and (re)schedule its emission.
    ///
    /// Returns `None` once the stacker has been abandoned.
    pub fn record(&self, key: K, amount: f64, critical: bool, now_ms: u64, payload: P) -> Option<Recorded> {
        let inner = &self.inner;
        let mut payload = Some(payload);

        loop {
            let entry = {
                let mut entries = inner.entries.lock();
                if inner.closed.load(Ordering::Acquire) {
                    return None;
                }
                Arc::clone(entries.entry(key.clone()).or_default())
            };

            let mut stack = entry.lock();
            if stack.retired {
                // Fired or abandoned between lookup and lock
                continue;
            }

            let last_update = stack.last_update_ms;
            let started = match last_update {
                Some(last) if now_ms.saturating_sub(last) < inner.window.window_ms => {
                    stack.accumulated += amount;
                    stack.critical |= critical;
                    stack.events += 1;
                    false
                }
                Some(_) => {
                    tracing::debug!(key = ?key, "Stack window expired before emission, restarting");
                    stack.accumulated = amount;
                    stack.critical = critical;
                    stack.events = 1;
                    true
                }
                None => {
                    stack.accumulated = amount;
                    stack.critical = critical;
                    stack.events = 1;
                    true
                }
            };
            stack.last_update_ms = Some(now_ms);
            stack.payload = payload.take();

            if let Some(previous) = stack.handle.take() {
                if !previous.cancel() {
                    tracing::trace!(key = ?key, task = previous.id(), "Emission already started, superseding");
                }
            }

            stack.generation += 1;
            let generation = stack.generation;
            let task_inner = Arc::clone(inner);
            let task_entry = Arc::clone(&entry);
            let task_key = key.clone();
            stack.handle = Some(inner.scheduler.schedule(
                inner.window.delay_ticks,
                Box::new(move || fire(&task_inner, task_key, &task_entry, generation)),
            ));

            tracing::trace!(
                key = ?key,
                accumulated = stack.accumulated,
                events = stack.events,
                "Stacked event"
            );
            return Some(Recorded {
                accumulated: stack.accumulated,
                started,
            });
        }
    }

    /// Number of keys with a pending emission.
    pub fn pending(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.inner.entries.lock().contains_key(key)
    }

    /// Drop every pending stack without emitting it and refuse further
    /// records. Returns the number of stacks dropped.
    pub fn abandon(&self) -> usize {
        let drained: Vec<Entry<P>> = {
            let mut entries = self.inner.entries.lock();
            self.inner.closed.store(true, Ordering::Release);
            entries.drain().map(|(_, entry)| entry).collect()
        };

        for entry in &drained {
            let mut stack = entry.lock();
            stack.retired = true;
            if let Some(handle) = stack.handle.take() {
                handle.cancel();
            }
        }
        drained.len()
    }
}

fn fire<K, P>(inner: &Inner<K, P>, key: K, entry: &Entry<P>, generation: u64)
where
    K: Eq + Hash + Debug,
{
    let emission = {
        let mut stack = entry.lock();
        if stack.retired || stack.generation != generation {
            return;
        }
        stack.retired = true;
        stack.handle = None;
        {
            let mut entries = inner.entries.lock();
            if entries.get(&key).is_some_and(|current| Arc::ptr_eq(current, entry)) {
                entries.remove(&key);
            }
        }
        let Some(payload) = stack.payload.take() else {
            return;
        };

        Emission {
            amount: stack.accumulated,
            critical: stack.critical,
            events: stack.events,
            payload,
        }
    };

    tracing::trace!(key = ?key, amount = emission.amount, events = emission.events, "Emitting stack");
    (inner.emit)(key, emission);
}
