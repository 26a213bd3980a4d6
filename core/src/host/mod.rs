//! Host-facing types
//!
//! The engine never talks to the game server directly. Everything it needs
//! (who is online, which players share a world, how to deliver an instruction
//! to one client) goes through [`HostBridge`]. Inbound events arrive as plain
//! snapshots so the engine holds no references into host state.

pub mod memory;

use std::fmt;

use uuid::Uuid;

use crate::format::StyledText;

/// Stable identity of a host entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for EntityId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A player receiving instructions.
pub type ViewerId = EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorldId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn offset(self, dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub fn distance_squared(self, other: Vec3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub world: WorldId,
    pub position: Vec3,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    Player,
    /// Any non-player entity, by host type name (`ZOMBIE`, `ARMOR_STAND`, ...).
    Other(String),
}

/// Entity state captured when the host delivered the event.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: EntityKind,
    pub location: Location,
    pub invisible: bool,
}

impl EntitySnapshot {
    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }

    pub fn type_name(&self) -> &str {
        match &self.kind {
            EntityKind::Player => "PLAYER",
            EntityKind::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionState {
    pub fall_distance: f32,
    pub vertical_velocity: f64,
    pub on_ground: bool,
}

impl MotionState {
    /// Vanilla critical hit: falling, moving down, airborne.
    pub fn is_critical_hit(&self) -> bool {
        self.fall_distance > 0.0 && self.vertical_velocity < 0.0 && !self.on_ground
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attacker {
    pub entity: EntitySnapshot,
    pub motion: MotionState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DamageEvent {
    pub attacker: Option<Attacker>,
    pub target: EntitySnapshot,
    pub final_damage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealEvent {
    pub target: EntitySnapshot,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSnapshot {
    pub id: EntityId,
    pub location: Location,
}

/// Metadata of a spawned text display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextDisplayFlags {
    /// No hitbox, gravity or collisions.
    pub non_physical: bool,
    /// Always rotates to face the viewer's camera.
    pub billboard: bool,
    pub shadowed: bool,
    pub see_through: bool,
    pub background_argb: u32,
}

impl TextDisplayFlags {
    pub const HOLOGRAM: Self = Self {
        non_physical: true,
        billboard: true,
        shadowed: true,
        see_through: true,
        background_argb: 0x4000_0000,
    };
}

/// One client-bound instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    SpawnText {
        entity_id: i32,
        position: Vec3,
        text: StyledText,
        flags: TextDisplayFlags,
    },
    Teleport {
        entity_id: i32,
        position: Vec3,
        yaw: f32,
    },
    Destroy {
        entity_id: i32,
    },
    Particles {
        location: Vec3,
        particle: String,
        count: u32,
        spread: f64,
    },
    Sound {
        location: Vec3,
        sound: String,
        volume: f32,
        pitch: f32,
    },
}

impl Instruction {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SpawnText { .. } => "spawn_text",
            Self::Teleport { .. } => "teleport",
            Self::Destroy { .. } => "destroy",
            Self::Particles { .. } => "particles",
            Self::Sound { .. } => "sound",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("viewer is not connected")]
    Disconnected,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unknown {kind} '{key}'")]
    UnknownKey { kind: &'static str, key: String },
}

/// Everything the engine asks of the game server.
///
/// Implementations must be callable from any thread; `send` must not block on
/// the engine's own locks.
pub trait HostBridge: Send + Sync {
    fn is_online(&self, viewer: ViewerId) -> bool;

    fn players_in_world(&self, world: WorldId) -> Vec<PlayerSnapshot>;

    fn send(&self, viewer: ViewerId, instruction: &Instruction) -> Result<(), SendError>;
}

/// Outcome of delivering one instruction to a set of viewers.
#[derive(Debug, Default, PartialEq)]
pub struct DeliveryReport {
    pub delivered: usize,
    /// Viewers left out because they were offline when the step ran.
    pub skipped: usize,
    pub failures: Vec<(ViewerId, SendError)>,
}

impl DeliveryReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn merge(&mut self, other: DeliveryReport) {
        self.delivered += other.delivered;
        self.skipped += other.skipped;
        self.failures.extend(other.failures);
    }
}

/// Send `instruction` to each viewer. A failure for one viewer never stops
/// delivery to the others.
pub fn fan_out(
    host: &dyn HostBridge,
    viewers: &[ViewerId],
    instruction: &Instruction,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    for &viewer in viewers {
        match host.send(viewer, instruction) {
            Ok(()) => report.delivered += 1,
            Err(e) => report.failures.push((viewer, e)),
        }
    }
    report
}

/// Like [`fan_out`], but viewers that disconnected in the meantime are
/// skipped instead of attempted.
pub fn fan_out_online(
    host: &dyn HostBridge,
    viewers: &[ViewerId],
    instruction: &Instruction,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    for &viewer in viewers {
        if !host.is_online(viewer) {
            report.skipped += 1;
            continue;
        }
        match host.send(viewer, instruction) {
            Ok(()) => report.delivered += 1,
            Err(e) => report.failures.push((viewer, e)),
        }
    }
    report
}
