#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use damage_numbers_core::commands::CommandSender;
use damage_numbers_core::format::StyledText;
use damage_numbers_core::host::memory::MemoryHost;
use damage_numbers_core::host::{
    Attacker, DamageEvent, EntityId, EntityKind, EntitySnapshot, HealEvent, Instruction, Location,
    MotionState, PlayerSnapshot, Vec3,
};
use damage_numbers_core::{
    Clock, DamageNumbers, HostBridge, ManualClock, Scheduler, Services, TickScheduler,
};

pub const FALLING: MotionState = MotionState {
    fall_distance: 0.8,
    vertical_velocity: -0.4,
    on_ground: false,
};

/// A temp config file, removed on drop.
pub struct TempConfig {
    pub path: PathBuf,
}

impl TempConfig {
    pub fn new(contents: &str) -> Self {
        let path = std::env::temp_dir()
            .join(format!("damage-numbers-it-{}", uuid::Uuid::new_v4()))
            .join("config.toml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        Self { path }
    }

    pub fn rewrite(&self, contents: &str) {
        std::fs::write(&self.path, contents).unwrap();
    }
}

impl Drop for TempConfig {
    fn drop(&mut self) {
        if let Some(dir) = self.path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}

/// One plugin instance over an in-memory server, driven tick by tick.
pub struct Server {
    pub host: Arc<MemoryHost>,
    pub ticks: Arc<TickScheduler>,
    pub clock: Arc<ManualClock>,
    pub plugin: DamageNumbers,
    pub config: TempConfig,
}

impl Server {
    pub fn start(config: &str) -> Self {
        let config = TempConfig::new(config);
        let host = Arc::new(MemoryHost::new());
        let ticks = Arc::new(TickScheduler::new());
        let clock = Arc::new(ManualClock::new(0));
        let services = Services::new(
            Arc::clone(&host) as Arc<dyn HostBridge>,
            Arc::clone(&ticks) as Arc<dyn Scheduler>,
            Arc::clone(&clock) as Arc<dyn Clock>,
        )
        .with_seed(42);
        let plugin = DamageNumbers::open(&config.path, services).unwrap();
        Self {
            host,
            ticks,
            clock,
            plugin,
            config,
        }
    }

    pub fn player_at(&self, position: Vec3) -> EntitySnapshot {
        let world = self.host.default_world();
        EntitySnapshot {
            id: self.host.spawn_player(world, position),
            kind: EntityKind::Player,
            location: Location { world, position },
            invisible: false,
        }
    }

    pub fn mob_at(&self, kind: &str, position: Vec3) -> EntitySnapshot {
        EntitySnapshot {
            id: EntityId::random(),
            kind: EntityKind::Other(kind.to_string()),
            location: Location {
                world: self.host.default_world(),
                position,
            },
            invisible: false,
        }
    }

    pub fn snapshot(&self, player: &EntitySnapshot) -> PlayerSnapshot {
        PlayerSnapshot {
            id: player.id,
            location: player.location,
        }
    }

    /// Plain text of every spawned hologram, with its receiver.
    pub fn holograms(&self) -> Vec<(EntityId, String)> {
        self.host
            .sent()
            .into_iter()
            .filter_map(|(viewer, instruction)| match instruction {
                Instruction::SpawnText { text, .. } => Some((viewer, text.plain())),
                _ => None,
            })
            .collect()
    }

    pub fn spawned_text(&self) -> Vec<StyledText> {
        self.host
            .sent()
            .into_iter()
            .filter_map(|(_, instruction)| match instruction {
                Instruction::SpawnText { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }
}

pub fn hit(attacker: &EntitySnapshot, target: &EntitySnapshot, amount: f64, motion: MotionState) -> DamageEvent {
    DamageEvent {
        attacker: Some(Attacker {
            entity: attacker.clone(),
            motion,
        }),
        target: target.clone(),
        final_damage: amount,
    }
}

pub fn heal(target: &EntitySnapshot, amount: f64) -> HealEvent {
    HealEvent {
        target: target.clone(),
        amount,
    }
}

/// Records every message it receives.
pub struct TestSender {
    pub name: String,
    pub permissions: Vec<String>,
    pub player: Option<PlayerSnapshot>,
    pub messages: Mutex<Vec<StyledText>>,
}

impl TestSender {
    pub fn console() -> Self {
        Self {
            name: "CONSOLE".to_string(),
            permissions: vec!["damagenumbers.reload".to_string()],
            player: None,
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn player(snapshot: PlayerSnapshot, permissions: &[&str]) -> Self {
        Self {
            name: "Steve".to_string(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            player: Some(snapshot),
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn last_message(&self) -> Option<StyledText> {
        self.messages.lock().last().cloned()
    }
}

impl CommandSender for TestSender {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    fn player(&self) -> Option<PlayerSnapshot> {
        self.player
    }

    fn send_message(&self, message: StyledText) {
        self.messages.lock().push(message);
    }
}
