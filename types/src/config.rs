//! Plugin configuration types.
//!
//! Every section uses `#[serde(default)]` so a partial file only overrides the
//! keys it names. Defaults match the configuration shipped with the plugin.

use serde::{Deserialize, Serialize};

/// Host scheduler quantum. All delays in the configuration are expressed in ticks.
pub const MILLIS_PER_TICK: u64 = 50;

/// Visual category of a single effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectCategory {
    Normal,
    Critical,
    Healing,
}

impl EffectCategory {
    pub fn is_critical(self) -> bool {
        self == Self::Critical
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Critical => "critical",
            Self::Healing => "healing",
        }
    }
}

/// Who receives an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Only the acting (or healed) player.
    Actor,
    /// Every player in the same world within the view range.
    Everyone,
}

impl Visibility {
    /// Anything other than `everyone` restricts the effect to the actor.
    pub fn parse(mode: &str) -> Self {
        if mode.trim().eq_ignore_ascii_case("everyone") {
            Self::Everyone
        } else {
            Self::Actor
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    /// Minimum spacing between two admitted damage events of one actor.
    pub cooldown_ms: u64,
    /// Log every sent hologram at debug level.
    pub debug: bool,
    pub formats: Formats,
    pub display: DisplaySettings,
    pub triggers: Triggers,
    pub animation: AnimationSettings,
    pub advanced: AdvancedSettings,
    pub healing: HealingSettings,
    pub particles: ParticleSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cooldown_ms: 50,
            debug: false,
            formats: Formats::default(),
            display: DisplaySettings::default(),
            triggers: Triggers::default(),
            animation: AnimationSettings::default(),
            advanced: AdvancedSettings::default(),
            healing: HealingSettings::default(),
            particles: ParticleSettings::default(),
        }
    }
}

impl Settings {
    pub fn lifetime_for(&self, category: EffectCategory) -> u32 {
        let lifetime = &self.advanced.lifetime;
        match category {
            EffectCategory::Normal => lifetime.normal,
            EffectCategory::Critical => lifetime.critical,
            EffectCategory::Healing => lifetime.healing,
        }
    }

    pub fn damage_visibility(&self) -> Visibility {
        Visibility::parse(&self.display.visibility)
    }

    pub fn healing_visibility(&self) -> Visibility {
        Visibility::parse(&self.healing.visibility)
    }
}

/// Display templates. `%s` is replaced by the formatted amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Formats {
    pub normal: String,
    pub critical: String,
    pub healing: String,
}

pub const DEFAULT_NORMAL_FORMAT: &str = "&7%s";
pub const DEFAULT_CRITICAL_FORMAT: &str = "&6&l%s ✧";
pub const DEFAULT_HEALING_FORMAT: &str = "&a+%s ❤";

impl Formats {
    pub fn template(&self, category: EffectCategory) -> &str {
        match category {
            EffectCategory::Normal => &self.normal,
            EffectCategory::Critical => &self.critical,
            EffectCategory::Healing => &self.healing,
        }
    }
}

impl Default for Formats {
    fn default() -> Self {
        Self {
            normal: DEFAULT_NORMAL_FORMAT.to_string(),
            critical: DEFAULT_CRITICAL_FORMAT.to_string(),
            healing: DEFAULT_HEALING_FORMAT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DisplaySettings {
    pub offset: Offset,
    /// Width of the symmetric X/Z jitter applied to each spawn position.
    pub random_offset: f64,
    /// `everyone`, or anything else for damager-only.
    pub visibility: String,
    pub view_range: f64,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            offset: Offset { x: 0.0, y: 0.8, z: 0.0 },
            random_offset: 0.4,
            visibility: "damager".to_string(),
            view_range: 32.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Triggers {
    pub player_vs_player: bool,
    pub player_vs_mob: bool,
    pub mob_vs_player: bool,
    pub healing: bool,
    pub ignore_invisible: bool,
    /// Host entity type names (e.g. `ARMOR_STAND`) that never show numbers.
    pub ignored_entity_types: Vec<String>,
}

impl Default for Triggers {
    fn default() -> Self {
        Self {
            player_vs_player: true,
            player_vs_mob: true,
            mob_vs_player: false,
            healing: true,
            ignore_invisible: true,
            ignored_entity_types: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AnimationSettings {
    /// Blocks risen per animation step.
    pub rise_speed: f64,
    pub bounce: bool,
    pub shake_on_crit: bool,
    /// Zero disables spinning.
    pub spin_speed: f64,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            rise_speed: 0.05,
            bounce: true,
            shake_on_crit: true,
            spin_speed: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AdvancedSettings {
    /// Artificial delay before a damage number is first shown.
    pub delay_ticks: u64,
    /// Artificial delay before a healing number is first shown.
    pub healing_delay_ticks: u64,
    pub lifetime: Lifetimes,
    pub stacking: StackingSettings,
    pub sounds: SoundSettings,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            delay_ticks: 0,
            healing_delay_ticks: 0,
            lifetime: Lifetimes::default(),
            stacking: StackingSettings::default(),
            sounds: SoundSettings::default(),
        }
    }
}

/// Hologram lifetimes in ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lifetimes {
    pub normal: u32,
    pub critical: u32,
    pub healing: u32,
}

impl Default for Lifetimes {
    fn default() -> Self {
        Self {
            normal: 40,
            critical: 40,
            healing: 40,
        }
    }
}

/// Damage stacking. Healing stacking is configured under [`HealingSettings`]
/// apart from its on/off switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StackingSettings {
    pub enabled: bool,
    pub window_ms: u64,
    pub delay_ticks: u64,
    pub healing_enabled: bool,
}

impl Default for StackingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            window_ms: 300,
            delay_ticks: 5,
            healing_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundSettings {
    pub normal: String,
    pub critical: String,
    pub healing: String,
    pub volume: f32,
    pub pitch: f32,
}

impl SoundSettings {
    /// Configured sound name, or `None` when the category is silent.
    pub fn name_for(&self, category: EffectCategory) -> Option<&str> {
        let name = match category {
            EffectCategory::Normal => &self.normal,
            EffectCategory::Critical => &self.critical,
            EffectCategory::Healing => &self.healing,
        };
        (!name.is_empty()).then_some(name.as_str())
    }
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            normal: String::new(),
            critical: String::new(),
            healing: String::new(),
            volume: 0.5,
            pitch: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HealingSettings {
    pub cooldown_ms: u64,
    /// `everyone`, or anything else for healer-only.
    pub visibility: String,
    pub view_range: f64,
    pub stack_window_ms: u64,
    pub stack_delay_ticks: u64,
}

impl Default for HealingSettings {
    fn default() -> Self {
        Self {
            cooldown_ms: 50,
            visibility: "healer".to_string(),
            view_range: 32.0,
            stack_window_ms: 500,
            stack_delay_ticks: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSpec {
    /// Host particle name; empty disables the burst.
    #[serde(rename = "type")]
    pub kind: String,
    pub count: u32,
    /// Spread on every axis around the burst center.
    pub offset: f64,
}

impl ParticleSpec {
    fn new(kind: &str, count: u32, offset: f64) -> Self {
        Self {
            kind: kind.to_string(),
            count,
            offset,
        }
    }
}

impl Default for ParticleSpec {
    fn default() -> Self {
        Self::new("", 0, 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSettings {
    pub normal: ParticleSpec,
    pub critical: ParticleSpec,
    pub healing: ParticleSpec,
}

impl ParticleSettings {
    pub fn for_category(&self, category: EffectCategory) -> &ParticleSpec {
        match category {
            EffectCategory::Normal => &self.normal,
            EffectCategory::Critical => &self.critical,
            EffectCategory::Healing => &self.healing,
        }
    }
}

impl Default for ParticleSettings {
    fn default() -> Self {
        Self {
            normal: ParticleSpec::new("DAMAGE_INDICATOR", 5, 0.3),
            critical: ParticleSpec::new("CRIT", 10, 0.4),
            healing: ParticleSpec::new("HEART", 3, 0.2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_yields_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let toml = r#"
cooldown-ms = 120

[advanced.stacking]
enabled = true
window-ms = 800

[animation]
spin-speed = 1.5
"#;
        let settings: Settings = toml::from_str(toml).unwrap();
        assert_eq!(settings.cooldown_ms, 120);
        assert!(settings.advanced.stacking.enabled);
        assert_eq!(settings.advanced.stacking.window_ms, 800);
        assert_eq!(settings.advanced.stacking.delay_ticks, 5);
        assert_eq!(settings.animation.spin_speed, 1.5);
        assert!(settings.animation.bounce);
        assert_eq!(settings.formats.critical, DEFAULT_CRITICAL_FORMAT);
    }

    #[test]
    fn test_particle_type_key() {
        let toml = r#"
[particles.critical]
type = "ENCHANTED_HIT"
count = 12
"#;
        let settings: Settings = toml::from_str(toml).unwrap();
        assert_eq!(settings.particles.critical.kind, "ENCHANTED_HIT");
        assert_eq!(settings.particles.critical.count, 12);
        assert_eq!(settings.particles.critical.offset, 0.0);
        assert_eq!(settings.particles.healing.kind, "HEART");
    }

    #[test]
    fn test_visibility_parse() {
        assert_eq!(Visibility::parse("everyone"), Visibility::Everyone);
        assert_eq!(Visibility::parse(" Everyone "), Visibility::Everyone);
        assert_eq!(Visibility::parse("damager"), Visibility::Actor);
        assert_eq!(Visibility::parse(""), Visibility::Actor);
    }

    #[test]
    fn test_category_lookups() {
        let settings = Settings::default();
        assert_eq!(settings.formats.template(EffectCategory::Healing), DEFAULT_HEALING_FORMAT);
        assert_eq!(settings.lifetime_for(EffectCategory::Critical), 40);
        assert_eq!(settings.particles.for_category(EffectCategory::Normal).kind, "DAMAGE_INDICATOR");
        assert_eq!(settings.advanced.sounds.name_for(EffectCategory::Normal), None);

        let mut sounds = SoundSettings::default();
        sounds.critical = "ENTITY_PLAYER_ATTACK_CRIT".to_string();
        assert_eq!(sounds.name_for(EffectCategory::Critical), Some("ENTITY_PLAYER_ATTACK_CRIT"));
        assert_eq!(settings.damage_visibility(), Visibility::Actor);
    }
}
