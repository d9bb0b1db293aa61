//! Relay state storage (players and fired missiles)

pub mod memory;

pub use memory::MemoryStore;

use uuid::Uuid;

use crate::ws::protocol::{PlayerInfo, Vector3};

/// Last known state of a joined player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub id: Uuid,
    pub pseudo: String,
    pub position: Vector3,
    pub rotation: Vector3,
    /// Unknown until the first position update
    pub velocity: Option<Vector3>,
    /// Sender clock of the last accepted position update
    pub last_timestamp: Option<u64>,
}

impl PlayerRecord {
    pub fn info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            pseudo: self.pseudo.clone(),
            position: self.position,
            rotation: self.rotation,
        }
    }
}

/// A fired missile, kept only for a short while
#[derive(Debug, Clone, PartialEq)]
pub struct MissileRecord {
    pub id: String,
    pub player_id: Uuid,
    pub position: Vector3,
    pub direction: Vector3,
    /// Server clock at fire time (unix ms)
    pub fired_at: u64,
}

/// Key-value storage scoped to the relay's lifetime
pub trait RelayStore: Send + 'static {
    fn upsert_player(&mut self, record: PlayerRecord);
    fn player(&self, id: &Uuid) -> Option<&PlayerRecord>;
    fn player_mut(&mut self, id: &Uuid) -> Option<&mut PlayerRecord>;
    fn remove_player(&mut self, id: &Uuid) -> Option<PlayerRecord>;
    fn players(&self) -> Vec<PlayerRecord>;
    fn player_count(&self) -> usize;

    fn insert_missile(&mut self, record: MissileRecord);
    /// Remove missiles fired more than `ttl_ms` before `now`, returning how many went
    fn purge_missiles(&mut self, now: u64, ttl_ms: u64) -> usize;
    fn missile_count(&self) -> usize;
}
