//! Event dispatch
//!
//! Entry point for host events. Each event is stamped with one clock reading,
//! run through the [`EventGate`], optionally deferred by the configured
//! display delay, and then either stacked or rendered immediately.
//!
//! ```text
//! DamageEvent ──► EventGate ──► [delay] ──► Stacker<DamageKey> ──┐
//! HealEvent   ──► EventGate ──► [delay] ──► Stacker<EntityId>  ──┼──► EffectPipeline
//!                                      └────────(no stacking)─────┘
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;

use damage_numbers_types::{EffectCategory, Settings};

use crate::clock::Clock;
use crate::effects::{EffectPipeline, EffectRequest};
use crate::gate::{EventGate, Rejection};
use crate::host::{DamageEvent, DeliveryReport, EntityId, HealEvent, HostBridge};
use crate::scheduler::Scheduler;
use crate::stacking::{EmitFn, Emission, StackWindow, Stacker};

/// Damage stacks are kept per (attacker, target) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DamageKey {
    pub attacker: EntityId,
    pub target: EntityId,
}

#[derive(Debug, PartialEq)]
pub enum DispatchOutcome {
    Rejected(Rejection),
    /// Routing runs after the display delay.
    Deferred { delay_ticks: u64 },
    Stacked { accumulated: f64, started: bool },
    Emitted(DeliveryReport),
    /// Arrived after the stacks were abandoned by a reload.
    Discarded,
}

struct Router {
    pipeline: Arc<EffectPipeline>,
    damage_stacks: Option<Stacker<DamageKey, EffectRequest>>,
    heal_stacks: Option<Stacker<EntityId, EffectRequest>>,
}

impl Router {
    fn route_damage(&self, key: DamageKey, critical: bool, request: EffectRequest, now_ms: u64) -> DispatchOutcome {
        match &self.damage_stacks {
            Some(stacks) => stack(stacks, key, critical, request, now_ms),
            None => DispatchOutcome::Emitted(self.pipeline.emit(request)),
        }
    }

    fn route_heal(&self, key: EntityId, request: EffectRequest, now_ms: u64) -> DispatchOutcome {
        match &self.heal_stacks {
            Some(stacks) => stack(stacks, key, false, request, now_ms),
            None => DispatchOutcome::Emitted(self.pipeline.emit(request)),
        }
    }
}

fn stack<K>(
    stacks: &Stacker<K, EffectRequest>,
    key: K,
    critical: bool,
    request: EffectRequest,
    now_ms: u64,
) -> DispatchOutcome
where
    K: Eq + std::hash::Hash + Clone + std::fmt::Debug + Send + Sync + 'static,
{
    let amount = request.amount;
    match stacks.record(key, amount, critical, now_ms, request) {
        Some(recorded) => DispatchOutcome::Stacked {
            accumulated: recorded.accumulated,
            started: recorded.started,
        },
        None => DispatchOutcome::Discarded,
    }
}

/// Emission callback: the stacked sum replaces the last event's amount, and
/// any critical hit in the burst makes the whole burst critical.
fn emit_stacked<K: 'static>(pipeline: &Arc<EffectPipeline>) -> EmitFn<K, EffectRequest> {
    let pipeline = Arc::clone(pipeline);
    Arc::new(move |_key: K, emission: Emission<EffectRequest>| {
        let category = match emission.payload.category {
            EffectCategory::Healing => EffectCategory::Healing,
            _ if emission.critical => EffectCategory::Critical,
            _ => EffectCategory::Normal,
        };
        pipeline.emit(EffectRequest {
            amount: emission.amount,
            category,
            ..emission.payload
        });
    })
}

pub struct Dispatcher {
    gate: EventGate,
    router: Arc<Router>,
    scheduler: Arc<dyn Scheduler>,
    clock: Arc<dyn Clock>,
    damage_delay_ticks: u64,
    heal_delay_ticks: u64,
}

impl Dispatcher {
    pub fn new(
        settings: &Settings,
        host: Arc<dyn HostBridge>,
        scheduler: Arc<dyn Scheduler>,
        clock: Arc<dyn Clock>,
        rng: Arc<Mutex<StdRng>>,
    ) -> Self {
        let pipeline = Arc::new(EffectPipeline::new(
            settings,
            Arc::clone(&host),
            Arc::clone(&scheduler),
            rng,
        ));

        let stacking = &settings.advanced.stacking;
        let damage_stacks = stacking.enabled.then(|| {
            Stacker::new(
                StackWindow::new(stacking.window_ms, stacking.delay_ticks),
                Arc::clone(&scheduler),
                emit_stacked(&pipeline),
            )
        });
        let heal_stacks = stacking.healing_enabled.then(|| {
            Stacker::new(
                StackWindow::new(settings.healing.stack_window_ms, settings.healing.stack_delay_ticks),
                Arc::clone(&scheduler),
                emit_stacked(&pipeline),
            )
        });

        Self {
            gate: EventGate::new(settings, host),
            router: Arc::new(Router {
                pipeline,
                damage_stacks,
                heal_stacks,
            }),
            scheduler,
            clock,
            damage_delay_ticks: settings.advanced.delay_ticks,
            heal_delay_ticks: settings.advanced.healing_delay_ticks,
        }
    }

    pub fn on_damage(&self, event: &DamageEvent) -> DispatchOutcome {
        let now_ms = self.clock.now_ms();
        let admission = match self.gate.admit_damage(event, now_ms) {
            Ok(admission) => admission,
            Err(rejection) => {
                tracing::trace!(entity = %event.target.id, reason = rejection.label(), "Damage rejected");
                return DispatchOutcome::Rejected(rejection);
            }
        };

        tracing::debug!(
            actor = %admission.actor,
            victim = %event.target.id,
            kind = admission.kind.label(),
            amount = event.final_damage,
            critical = admission.critical,
            "Damage admitted"
        );

        let key = DamageKey {
            attacker: event
                .attacker
                .as_ref()
                .map_or(admission.actor, |attacker| attacker.entity.id),
            target: event.target.id,
        };
        let critical = admission.critical;
        let request = EffectRequest {
            origin: event.target.location.position,
            amount: event.final_damage,
            category: if critical {
                EffectCategory::Critical
            } else {
                EffectCategory::Normal
            },
            viewers: admission.viewers,
        };

        self.route(self.damage_delay_ticks, move |router| {
            router.route_damage(key, critical, request, now_ms)
        })
    }

    pub fn on_heal(&self, event: &HealEvent) -> DispatchOutcome {
        let now_ms = self.clock.now_ms();
        let admission = match self.gate.admit_heal(event, now_ms) {
            Ok(admission) => admission,
            Err(rejection) => {
                tracing::trace!(entity = %event.target.id, reason = rejection.label(), "Heal rejected");
                return DispatchOutcome::Rejected(rejection);
            }
        };

        tracing::debug!(actor = %admission.actor, amount = event.amount, "Heal admitted");

        let key = admission.actor;
        let request = EffectRequest {
            origin: event.target.location.position,
            amount: event.amount,
            category: EffectCategory::Healing,
            viewers: admission.viewers,
        };

        self.route(self.heal_delay_ticks, move |router| {
            router.route_heal(key, request, now_ms)
        })
    }

    /// Render a request right away, skipping gate, delay and stacking.
    pub fn present(&self, request: EffectRequest) -> DeliveryReport {
        self.router.pipeline.emit(request)
    }

    /// Drop all pending stacks without emitting them. Holograms already on
    /// screen finish their animation.
    pub fn abandon(&self) -> usize {
        let damage = self.router.damage_stacks.as_ref().map_or(0, Stacker::abandon);
        let heal = self.router.heal_stacks.as_ref().map_or(0, Stacker::abandon);
        damage + heal
    }

    /// Keys with a pending stacked emission, damage and healing combined.
    pub fn pending_stacks(&self) -> usize {
        let damage = self.router.damage_stacks.as_ref().map_or(0, Stacker::pending);
        let heal = self.router.heal_stacks.as_ref().map_or(0, Stacker::pending);
        damage + heal
    }

    fn route<F>(&self, delay_ticks: u64, route: F) -> DispatchOutcome
    where
        F: FnOnce(&Router) -> DispatchOutcome + Send + 'static,
    {
        if delay_ticks == 0 {
            return route(&self.router);
        }

        let router = Arc::clone(&self.router);
        self.scheduler.schedule(
            delay_ticks,
            Box::new(move || {
                let outcome = route(&router);
                tracing::trace!(outcome = ?outcome, "Delayed dispatch");
            }),
        );
        DispatchOutcome::Deferred { delay_ticks }
    }
}
