//! Shared types for damage-numbers: configuration sections and number formatting.

pub mod config;
pub mod formatting;

pub use config::{
    AdvancedSettings, AnimationSettings, DisplaySettings, EffectCategory, Formats,
    HealingSettings, Lifetimes, MILLIS_PER_TICK, Offset, ParticleSettings, ParticleSpec, Settings,
    SoundSettings, StackingSettings, Triggers, Visibility,
};
