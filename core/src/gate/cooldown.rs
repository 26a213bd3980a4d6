//! Per-actor admission cooldowns.

use hashbrown::HashMap;
use parking_lot::Mutex;

use crate::host::EntityId;

/// Map size at which expired records are first swept.
pub const SWEEP_THRESHOLD: usize = 1024;

#[derive(Debug)]
struct Records {
    last_admitted: HashMap<EntityId, u64>,
    /// Size that triggers the next sweep.
    sweep_at: usize,
}

/// Last admission time per actor.
///
/// A record older than the cooldown behaves exactly like a missing one, so
/// expired records are swept once the map reaches `sweep_at`. After a sweep
/// the trigger moves to twice the surviving size (never below
/// [`SWEEP_THRESHOLD`]), so a map full of live records is not rescanned on
/// every admission.
#[derive(Debug)]
pub struct CooldownMap {
    cooldown_ms: u64,
    records: Mutex<Records>,
}

impl CooldownMap {
    pub fn new(cooldown_ms: u64) -> Self {
        Self {
            cooldown_ms,
            records: Mutex::new(Records {
                last_admitted: HashMap::new(),
                sweep_at: SWEEP_THRESHOLD,
            }),
        }
    }

    /// Would `actor` be admitted at `now_ms`? Never records anything.
    pub fn is_ready(&self, actor: EntityId, now_ms: u64) -> bool {
        self.records
            .lock()
            .last_admitted
            .get(&actor)
            .is_none_or(|&last| now_ms.saturating_sub(last) >= self.cooldown_ms)
    }

    /// Admit `actor` if its cooldown has elapsed, recording `now_ms` as its
    /// last admission. Rejections leave the record untouched.
    pub fn try_acquire(&self, actor: EntityId, now_ms: u64) -> bool {
        let mut records = self.records.lock();
        if let Some(&last) = records.last_admitted.get(&actor) {
            if now_ms.saturating_sub(last) < self.cooldown_ms {
                return false;
            }
        }

        if records.last_admitted.len() >= records.sweep_at {
            let cooldown = self.cooldown_ms;
            let before = records.last_admitted.len();
            records
                .last_admitted
                .retain(|_, last| now_ms.saturating_sub(*last) < cooldown);
            let kept = records.last_admitted.len();
            records.sweep_at = (kept * 2).max(SWEEP_THRESHOLD);
            tracing::trace!(swept = before - kept, next = records.sweep_at, "Swept expired cooldowns");
        }

        records.last_admitted.insert(actor, now_ms);
        true
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.records.lock().last_admitted.len()
    }

    #[cfg(test)]
    fn sweep_at(&self) -> usize {
        self.records.lock().sweep_at
    }
}
