//! Floating damage and heal numbers for a block-game server.
//!
//! The host feeds damage and heal events into [`DamageNumbers`]; the engine
//! filters them, optionally stacks rapid hits into one number, and drives a
//! short client-side hologram animation through [`host::HostBridge`].

pub mod clock;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod effects;
pub mod format;
pub mod gate;
pub mod host;
pub mod logging;
pub mod plugin;
pub mod scheduler;
pub mod stacking;

// Re-exports for convenience
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use commands::{CommandError, CommandSender};
pub use config::{ConfigError, ConfigWarning};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use host::{DamageEvent, HealEvent, HostBridge, Instruction};
pub use plugin::{DamageNumbers, Services, TestEffect};
pub use scheduler::{Scheduler, TaskHandle, TickScheduler, TokioScheduler};

pub use damage_numbers_types::{EffectCategory, Settings};
