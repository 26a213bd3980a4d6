//! In-memory host
//!
//! Keeps a player table and records every delivered instruction. Used by the
//! dry-run CLI and by tests; it is also a compact reference for what a real
//! host adapter has to provide.

use hashbrown::{HashMap, HashSet};
use parking_lot::Mutex;
use uuid::Uuid;

use super::{
    EntityId, HostBridge, Instruction, Location, PlayerSnapshot, SendError, Vec3, ViewerId,
    WorldId,
};

#[derive(Debug, Clone)]
struct PlayerEntry {
    location: Location,
    online: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    players: HashMap<EntityId, PlayerEntry>,
    failing: HashSet<ViewerId>,
    sent: Vec<(ViewerId, Instruction)>,
}

#[derive(Debug)]
pub struct MemoryHost {
    default_world: WorldId,
    state: Mutex<MemoryState>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            default_world: WorldId(Uuid::new_v4()),
            state: Mutex::new(MemoryState::default()),
        }
    }

    pub fn default_world(&self) -> WorldId {
        self.default_world
    }

    /// Register a new online player and return its id.
    pub fn spawn_player(&self, world: WorldId, position: Vec3) -> EntityId {
        let id = EntityId::random();
        self.state.lock().players.insert(
            id,
            PlayerEntry {
                location: Location { world, position },
                online: true,
            },
        );
        id
    }

    pub fn disconnect(&self, id: EntityId) {
        if let Some(entry) = self.state.lock().players.get_mut(&id) {
            entry.online = false;
        }
    }

    pub fn reconnect(&self, id: EntityId) {
        if let Some(entry) = self.state.lock().players.get_mut(&id) {
            entry.online = true;
        }
    }

    /// Every later send to `viewer` fails with a transport error.
    pub fn fail_sends_to(&self, viewer: ViewerId) {
        self.state.lock().failing.insert(viewer);
    }

    /// All delivered instructions, in delivery order.
    pub fn sent(&self) -> Vec<(ViewerId, Instruction)> {
        self.state.lock().sent.clone()
    }

    pub fn take_sent(&self) -> Vec<(ViewerId, Instruction)> {
        std::mem::take(&mut self.state.lock().sent)
    }

    pub fn sent_to(&self, viewer: ViewerId) -> Vec<Instruction> {
        self.state
            .lock()
            .sent
            .iter()
            .filter(|(to, _)| *to == viewer)
            .map(|(_, instruction)| instruction.clone())
            .collect()
    }

    /// Number of delivered instructions of one kind (see [`Instruction::kind`]).
    pub fn count_kind(&self, kind: &str) -> usize {
        self.state
            .lock()
            .sent
            .iter()
            .filter(|(_, instruction)| instruction.kind() == kind)
            .count()
    }
}

impl HostBridge for MemoryHost {
    fn is_online(&self, viewer: ViewerId) -> bool {
        self.state
            .lock()
            .players
            .get(&viewer)
            .is_some_and(|entry| entry.online)
    }

    fn players_in_world(&self, world: WorldId) -> Vec<PlayerSnapshot> {
        self.state
            .lock()
            .players
            .iter()
            .filter(|(_, entry)| entry.online && entry.location.world == world)
            .map(|(id, entry)| PlayerSnapshot {
                id: *id,
                location: entry.location,
            })
            .collect()
    }

    fn send(&self, viewer: ViewerId, instruction: &Instruction) -> Result<(), SendError> {
        let mut state = self.state.lock();
        if !state.players.get(&viewer).is_some_and(|entry| entry.online) {
            return Err(SendError::Disconnected);
        }
        if state.failing.contains(&viewer) {
            return Err(SendError::Transport("connection reset".to_string()));
        }
        state.sent.push((viewer, instruction.clone()));
        Ok(())
    }
}
