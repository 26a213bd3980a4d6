//! Plugin lifecycle
//!
//! [`DamageNumbers`] owns the current runtime (settings plus dispatcher) and
//! swaps it on reload. Host event callbacks go through it; each call works
//! on one runtime snapshot, so a reload never changes the rules halfway
//! through an event.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rand::SeedableRng;
use rand::rngs::StdRng;

use damage_numbers_types::{EffectCategory, Settings};

use crate::clock::Clock;
use crate::config::{self, ConfigError, ConfigWarning};
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::effects::EffectRequest;
use crate::host::{DamageEvent, DeliveryReport, HealEvent, HostBridge, PlayerSnapshot};
use crate::scheduler::Scheduler;

/// Host-provided collaborators shared by every runtime.
#[derive(Clone)]
pub struct Services {
    pub host: Arc<dyn HostBridge>,
    pub scheduler: Arc<dyn Scheduler>,
    pub clock: Arc<dyn Clock>,
    pub rng: Arc<Mutex<StdRng>>,
}

impl Services {
    pub fn new(host: Arc<dyn HostBridge>, scheduler: Arc<dyn Scheduler>, clock: Arc<dyn Clock>) -> Self {
        Self {
            host,
            scheduler,
            clock,
            rng: Arc::new(Mutex::new(StdRng::from_entropy())),
        }
    }

    /// Replace the random source with a seeded one.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(StdRng::seed_from_u64(seed)));
        self
    }
}

/// Canned effects for the test command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestEffect {
    Hit,
    Crit,
    Heal,
}

impl TestEffect {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "hit" => Some(Self::Hit),
            "crit" => Some(Self::Crit),
            "heal" => Some(Self::Heal),
            _ => None,
        }
    }

    pub fn amount(self) -> f64 {
        match self {
            Self::Hit | Self::Heal => 5.0,
            Self::Crit => 10.0,
        }
    }

    pub fn category(self) -> EffectCategory {
        match self {
            Self::Hit => EffectCategory::Normal,
            Self::Crit => EffectCategory::Critical,
            Self::Heal => EffectCategory::Healing,
        }
    }
}

struct Runtime {
    settings: Settings,
    dispatcher: Dispatcher,
}

impl Runtime {
    fn build(settings: Settings, services: &Services) -> Self {
        let dispatcher = Dispatcher::new(
            &settings,
            Arc::clone(&services.host),
            Arc::clone(&services.scheduler),
            Arc::clone(&services.clock),
            Arc::clone(&services.rng),
        );
        Self {
            settings,
            dispatcher,
        }
    }
}

pub struct DamageNumbers {
    config_path: PathBuf,
    services: Services,
    runtime: RwLock<Arc<Runtime>>,
}

impl DamageNumbers {
    /// Load `config_path` (writing the default file first if it is missing)
    /// and start with the validated settings.
    pub fn open(config_path: impl Into<PathBuf>, services: Services) -> Result<Self, ConfigError> {
        let config_path = config_path.into();
        config::write_default(&config_path)?;
        let (settings, _warnings) = config::load_validated(&config_path)?;
        Ok(Self::with_settings(config_path, settings, services))
    }

    /// Start with already loaded settings. `config_path` is only read on
    /// reload.
    pub fn with_settings(config_path: impl Into<PathBuf>, settings: Settings, services: Services) -> Self {
        let (settings, warnings) = config::validate(settings);
        for warning in &warnings {
            tracing::warn!(key = %warning.key, "{}", warning.message);
        }

        let runtime = Runtime::build(settings, &services);
        tracing::info!(
            stacking = runtime.settings.advanced.stacking.enabled,
            healing_stacking = runtime.settings.advanced.stacking.healing_enabled,
            "Damage numbers enabled"
        );
        Self {
            config_path: config_path.into(),
            services,
            runtime: RwLock::new(Arc::new(runtime)),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn current(&self) -> Arc<Runtime> {
        Arc::clone(&self.runtime.read())
    }

    pub fn settings(&self) -> Settings {
        self.current().settings.clone()
    }

    pub fn on_damage(&self, event: &DamageEvent) -> DispatchOutcome {
        self.current().dispatcher.on_damage(event)
    }

    pub fn on_heal(&self, event: &HealEvent) -> DispatchOutcome {
        self.current().dispatcher.on_heal(event)
    }

    /// Show a canned effect to `player` only, bypassing gate and stacking.
    pub fn show_test(&self, player: &PlayerSnapshot, effect: TestEffect) -> DeliveryReport {
        let request = EffectRequest {
            origin: player.location.position,
            amount: effect.amount(),
            category: effect.category(),
            viewers: Arc::from(vec![player.id]),
        };
        tracing::debug!(player = %player.id, effect = ?effect, "Showing test effect");
        self.current().dispatcher.present(request)
    }

    /// Re-read the config file and rebuild all engine state.
    ///
    /// Pending stacks of the old runtime are dropped without being shown and
    /// cooldowns start empty. Holograms already on screen finish normally. On
    /// error the current runtime stays in place.
    pub fn reload(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        let (settings, warnings) = config::load_validated(&self.config_path)?;
        let fresh = Arc::new(Runtime::build(settings, &self.services));

        let previous = std::mem::replace(&mut *self.runtime.write(), fresh);
        let abandoned = previous.dispatcher.abandon();
        tracing::info!(
            path = %self.config_path.display(),
            abandoned,
            warnings = warnings.len(),
            "Configuration reloaded"
        );
        Ok(warnings)
    }

    /// Drop pending stacks; called when the host disables the plugin.
    pub fn shutdown(&self) {
        let abandoned = self.current().dispatcher.abandon();
        tracing::info!(abandoned, "Damage numbers disabled");
    }
}
