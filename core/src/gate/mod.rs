//! Event admission
//!
//! The gate decides whether a host event produces an effect and who sees it.
//! Stateless predicates (trigger toggles, invisibility, ignored types) run
//! first; the cooldown check runs last because admission is its only side
//! effect.

mod cooldown;
mod triggers;
mod viewers;

pub use cooldown::{CooldownMap, SWEEP_THRESHOLD};
pub use triggers::{DamageKind, Rejection, TriggerRules};
pub use viewers::ViewerPolicy;

use std::sync::Arc;

use damage_numbers_types::Settings;

use crate::host::{DamageEvent, EntityId, HealEvent, HostBridge, ViewerId};

/// An admitted damage event.
#[derive(Debug, Clone, PartialEq)]
pub struct DamageAdmission {
    pub kind: DamageKind,
    /// The player whose cooldown was charged: the attacker, or the damaged
    /// player for mob-vs-player hits.
    pub actor: EntityId,
    pub critical: bool,
    pub viewers: Arc<[ViewerId]>,
}

/// An admitted heal event.
#[derive(Debug, Clone, PartialEq)]
pub struct HealAdmission {
    pub actor: EntityId,
    pub viewers: Arc<[ViewerId]>,
}

pub struct EventGate {
    host: Arc<dyn HostBridge>,
    rules: TriggerRules,
    damage_cooldowns: CooldownMap,
    heal_cooldowns: CooldownMap,
    damage_viewers: ViewerPolicy,
    heal_viewers: ViewerPolicy,
}

impl EventGate {
    pub fn new(settings: &Settings, host: Arc<dyn HostBridge>) -> Self {
        Self {
            host,
            rules: TriggerRules::new(&settings.triggers),
            damage_cooldowns: CooldownMap::new(settings.cooldown_ms),
            heal_cooldowns: CooldownMap::new(settings.healing.cooldown_ms),
            damage_viewers: ViewerPolicy::new(
                settings.damage_visibility(),
                settings.display.view_range,
            ),
            heal_viewers: ViewerPolicy::new(
                settings.healing_visibility(),
                settings.healing.view_range,
            ),
        }
    }

    pub fn admit_damage(&self, event: &DamageEvent, now_ms: u64) -> Result<DamageAdmission, Rejection> {
        let attacker = event.attacker.as_ref().map(|a| &a.entity);
        let kind = self.rules.check_damage(attacker, &event.target)?;

        let (actor, critical) = match (kind, &event.attacker) {
            (DamageKind::MobVsPlayer, _) | (_, None) => (event.target.id, false),
            (_, Some(attacker)) => (attacker.entity.id, attacker.motion.is_critical_hit()),
        };

        if !self.damage_cooldowns.try_acquire(actor, now_ms) {
            return Err(Rejection::Cooldown);
        }

        let viewers = self
            .damage_viewers
            .select(self.host.as_ref(), actor, &event.target.location);
        Ok(DamageAdmission {
            kind,
            actor,
            critical,
            viewers: viewers.into(),
        })
    }

    pub fn admit_heal(&self, event: &HealEvent, now_ms: u64) -> Result<HealAdmission, Rejection> {
        self.rules.check_heal(&event.target)?;

        let actor = event.target.id;
        if !self.heal_cooldowns.try_acquire(actor, now_ms) {
            return Err(Rejection::Cooldown);
        }

        let viewers = self
            .heal_viewers
            .select(self.host.as_ref(), actor, &event.target.location);
        Ok(HealAdmission {
            actor,
            viewers: viewers.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;
    use crate::host::{Attacker, EntityKind, EntitySnapshot, Location, MotionState, Vec3, WorldId};

    struct Fixture {
        host: Arc<MemoryHost>,
        world: WorldId,
    }

    impl Fixture {
        fn new() -> Self {
            let host = Arc::new(MemoryHost::new());
            let world = host.default_world();
            Self { host, world }
        }

        fn gate(&self, settings: &Settings) -> EventGate {
            EventGate::new(settings, Arc::clone(&self.host) as Arc<dyn HostBridge>)
        }

        fn player(&self, position: Vec3) -> EntitySnapshot {
            EntitySnapshot {
                id: self.host.spawn_player(self.world, position),
                kind: EntityKind::Player,
                location: Location {
                    world: self.world,
                    position,
                },
                invisible: false,
            }
        }

        fn mob(&self, name: &str, position: Vec3) -> EntitySnapshot {
            EntitySnapshot {
                id: EntityId::random(),
                kind: EntityKind::Other(name.to_string()),
                location: Location {
                    world: self.world,
                    position,
                },
                invisible: false,
            }
        }
    }

    fn hit(attacker: Option<&EntitySnapshot>, target: &EntitySnapshot, motion: MotionState) -> DamageEvent {
        DamageEvent {
            attacker: attacker.map(|entity| Attacker {
                entity: entity.clone(),
                motion,
            }),
            target: target.clone(),
            final_damage: 4.0,
        }
    }

    const FALLING: MotionState = MotionState {
        fall_distance: 1.0,
        vertical_velocity: -0.5,
        on_ground: false,
    };

    #[test]
    fn test_player_hits_mob() {
        let f = Fixture::new();
        let gate = f.gate(&Settings::default());
        let player = f.player(Vec3::default());
        let zombie = f.mob("ZOMBIE", Vec3::new(2.0, 0.0, 0.0));

        let admission = gate
            .admit_damage(&hit(Some(&player), &zombie, FALLING), 0)
            .unwrap();
        assert_eq!(admission.kind, DamageKind::PlayerVsMob);
        assert_eq!(admission.actor, player.id);
        assert!(admission.critical);
        assert_eq!(&*admission.viewers, &[player.id]);
    }

    #[test]
    fn test_cooldown_is_charged_only_on_admission() {
        let f = Fixture::new();
        let gate = f.gate(&Settings::default());
        let player = f.player(Vec3::default());
        let zombie = f.mob("ZOMBIE", Vec3::default());
        let mut ghost = f.mob("ZOMBIE", Vec3::default());
        ghost.invisible = true;

        // rejected by a predicate: no cooldown record
        assert_eq!(
            gate.admit_damage(&hit(Some(&player), &ghost, MotionState::default()), 0),
            Err(Rejection::InvisibleTarget)
        );
        assert!(gate.admit_damage(&hit(Some(&player), &zombie, MotionState::default()), 10).is_ok());
        assert_eq!(
            gate.admit_damage(&hit(Some(&player), &zombie, MotionState::default()), 40),
            Err(Rejection::Cooldown)
        );
        assert!(gate.admit_damage(&hit(Some(&player), &zombie, MotionState::default()), 60).is_ok());
    }

    #[test]
    fn test_mob_vs_player_charges_the_victim() {
        let f = Fixture::new();
        let mut settings = Settings::default();
        settings.triggers.mob_vs_player = true;
        let gate = f.gate(&settings);
        let player = f.player(Vec3::default());
        let skeleton = f.mob("SKELETON", Vec3::new(5.0, 0.0, 0.0));

        let admission = gate
            .admit_damage(&hit(Some(&skeleton), &player, FALLING), 0)
            .unwrap();
        assert_eq!(admission.kind, DamageKind::MobVsPlayer);
        assert_eq!(admission.actor, player.id);
        assert!(!admission.critical);
        assert_eq!(&*admission.viewers, &[player.id]);

        let environment = DamageEvent {
            attacker: None,
            target: player.clone(),
            final_damage: 1.0,
        };
        assert_eq!(gate.admit_damage(&environment, 20), Err(Rejection::Cooldown));
    }

    #[test]
    fn test_everyone_visibility_uses_target_location() {
        let f = Fixture::new();
        let mut settings = Settings::default();
        settings.display.visibility = "everyone".to_string();
        settings.display.view_range = 10.0;
        let gate = f.gate(&settings);

        let attacker = f.player(Vec3::default());
        let target = f.mob("ZOMBIE", Vec3::new(20.0, 0.0, 0.0));
        let bystander = f.player(Vec3::new(25.0, 0.0, 0.0));

        let admission = gate
            .admit_damage(&hit(Some(&attacker), &target, MotionState::default()), 0)
            .unwrap();
        // the attacker is 20 blocks from the target, outside the range
        assert_eq!(&*admission.viewers, &[bystander.id]);
    }

    #[test]
    fn test_heal_admission() {
        let f = Fixture::new();
        let gate = f.gate(&Settings::default());
        let player = f.player(Vec3::default());
        let cow = f.mob("COW", Vec3::default());

        let heal = |target: &EntitySnapshot| HealEvent {
            target: target.clone(),
            amount: 2.0,
        };

        assert_eq!(gate.admit_heal(&heal(&cow), 0), Err(Rejection::NotAPlayer));
        let admission = gate.admit_heal(&heal(&player), 0).unwrap();
        assert_eq!(admission.actor, player.id);
        assert_eq!(gate.admit_heal(&heal(&player), 30), Err(Rejection::Cooldown));
        assert!(gate.admit_heal(&heal(&player), 50).is_ok());
    }

    #[test]
    fn test_damage_and_heal_cooldowns_are_separate() {
        let f = Fixture::new();
        let gate = f.gate(&Settings::default());
        let player = f.player(Vec3::default());
        let zombie = f.mob("ZOMBIE", Vec3::default());

        assert!(gate.admit_damage(&hit(Some(&player), &zombie, MotionState::default()), 0).is_ok());
        let heal = HealEvent {
            target: player.clone(),
            amount: 1.0,
        };
        assert!(gate.admit_heal(&heal, 0).is_ok());
    }
}
