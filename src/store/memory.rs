//! In-memory relay store

use std::collections::HashMap;

use uuid::Uuid;

use super::{MissileRecord, PlayerRecord, RelayStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    players: HashMap<Uuid, PlayerRecord>,
    missiles: HashMap<String, MissileRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RelayStore for MemoryStore {
    fn upsert_player(&mut self, record: PlayerRecord) {
        self.players.insert(record.id, record);
    }

    fn player(&self, id: &Uuid) -> Option<&PlayerRecord> {
        self.players.get(id)
    }

    fn player_mut(&mut self, id: &Uuid) -> Option<&mut PlayerRecord> {
        self.players.get_mut(id)
    }

    fn remove_player(&mut self, id: &Uuid) -> Option<PlayerRecord> {
        self.players.remove(id)
    }

    fn players(&self) -> Vec<PlayerRecord> {
        self.players.values().cloned().collect()
    }

    fn player_count(&self) -> usize {
        self.players.len()
    }

    fn insert_missile(&mut self, record: MissileRecord) {
        self.missiles.insert(record.id.clone(), record);
    }

    fn purge_missiles(&mut self, now: u64, ttl_ms: u64) -> usize {
        let before = self.missiles.len();
        self.missiles
            .retain(|_, m| now.saturating_sub(m.fired_at) <= ttl_ms);
        before - self.missiles.len()
    }

    fn missile_count(&self) -> usize {
        self.missiles.len()
    }
}
