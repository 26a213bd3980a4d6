//! Trigger toggles and target filters.

use hashbrown::HashSet;

use damage_numbers_types::Triggers;

use crate::host::EntitySnapshot;

/// Who hit whom. Non-player attackers (mobs, projectiles without a player
/// shooter, the environment) all count as the mob side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DamageKind {
    PlayerVsPlayer,
    PlayerVsMob,
    MobVsPlayer,
}

impl DamageKind {
    /// `None` when no player is involved at all.
    pub fn classify(attacker: Option<&EntitySnapshot>, target: &EntitySnapshot) -> Option<Self> {
        let player_attacker = attacker.is_some_and(EntitySnapshot::is_player);
        match (player_attacker, target.is_player()) {
            (true, true) => Some(Self::PlayerVsPlayer),
            (true, false) => Some(Self::PlayerVsMob),
            (false, true) => Some(Self::MobVsPlayer),
            (false, false) => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::PlayerVsPlayer => "pvp",
            Self::PlayerVsMob => "pvm",
            Self::MobVsPlayer => "mvp",
        }
    }
}

/// Why an event was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NoPlayerInvolved,
    TriggerDisabled(DamageKind),
    HealingDisabled,
    /// Heal events only show for players.
    NotAPlayer,
    InvisibleTarget,
    IgnoredType,
    Cooldown,
}

impl Rejection {
    pub fn label(self) -> &'static str {
        match self {
            Self::NoPlayerInvolved => "no player involved",
            Self::TriggerDisabled(_) => "trigger disabled",
            Self::HealingDisabled => "healing disabled",
            Self::NotAPlayer => "not a player",
            Self::InvisibleTarget => "invisible target",
            Self::IgnoredType => "ignored entity type",
            Self::Cooldown => "cooldown",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TriggerRules {
    player_vs_player: bool,
    player_vs_mob: bool,
    mob_vs_player: bool,
    healing: bool,
    ignore_invisible: bool,
    /// Upper-case host type names.
    ignored_types: HashSet<String>,
}

impl TriggerRules {
    pub fn new(triggers: &Triggers) -> Self {
        Self {
            player_vs_player: triggers.player_vs_player,
            player_vs_mob: triggers.player_vs_mob,
            mob_vs_player: triggers.mob_vs_player,
            healing: triggers.healing,
            ignore_invisible: triggers.ignore_invisible,
            ignored_types: triggers
                .ignored_entity_types
                .iter()
                .map(|name| name.trim().to_ascii_uppercase())
                .collect(),
        }
    }

    pub fn enabled(&self, kind: DamageKind) -> bool {
        match kind {
            DamageKind::PlayerVsPlayer => self.player_vs_player,
            DamageKind::PlayerVsMob => self.player_vs_mob,
            DamageKind::MobVsPlayer => self.mob_vs_player,
        }
    }

    pub fn healing_enabled(&self) -> bool {
        self.healing
    }

    pub fn is_ignored_type(&self, target: &EntitySnapshot) -> bool {
        self.ignored_types
            .contains(target.type_name().to_ascii_uppercase().as_str())
    }

    /// Every stateless damage predicate, in order.
    pub fn check_damage(
        &self,
        attacker: Option<&EntitySnapshot>,
        target: &EntitySnapshot,
    ) -> Result<DamageKind, Rejection> {
        let kind = DamageKind::classify(attacker, target).ok_or(Rejection::NoPlayerInvolved)?;
        if !self.enabled(kind) {
            return Err(Rejection::TriggerDisabled(kind));
        }
        if target.invisible && self.ignore_invisible {
            return Err(Rejection::InvisibleTarget);
        }
        if self.is_ignored_type(target) {
            return Err(Rejection::IgnoredType);
        }
        Ok(kind)
    }

    pub fn check_heal(&self, target: &EntitySnapshot) -> Result<(), Rejection> {
        if !target.is_player() {
            return Err(Rejection::NotAPlayer);
        }
        if !self.healing {
            return Err(Rejection::HealingDisabled);
        }
        Ok(())
    }
}
