//! Relay state machine: one client event in, addressed fan-out messages out

use tracing::{debug, info};
use uuid::Uuid;

use crate::store::{MemoryStore, MissileRecord, PlayerRecord, RelayStore};
use crate::ws::protocol::{ClientMsg, PlayerMoved, ServerMsg, Vector3};

/// Who should receive an outbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Only this connection
    Only(Uuid),
    /// Everyone but this connection
    AllExcept(Uuid),
    /// Every connection, sender included
    All,
}

/// Message addressed to a set of connections
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: Recipient,
    pub msg: ServerMsg,
}

impl Outbound {
    fn new(to: Recipient, msg: ServerMsg) -> Self {
        Self { to, msg }
    }
}

/// Relay bookkeeping. Holds no physics; positions are trusted as sent.
pub struct RelayState<S: RelayStore = MemoryStore> {
    store: S,
    missile_ttl_ms: u64,
    /// Disambiguates missiles fired within the same millisecond
    missile_seq: u64,
}

impl RelayState<MemoryStore> {
    pub fn in_memory(missile_ttl_ms: u64) -> Self {
        Self::new(MemoryStore::new(), missile_ttl_ms)
    }
}

impl<S: RelayStore> RelayState<S> {
    pub fn new(store: S, missile_ttl_ms: u64) -> Self {
        Self {
            store,
            missile_ttl_ms,
            missile_seq: 0,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handle a validated client message received at `now` (unix ms)
    pub fn handle(&mut self, conn_id: Uuid, msg: ClientMsg, now: u64) -> Vec<Outbound> {
        match msg {
            ClientMsg::PlayerJoin {
                pseudo,
                position,
                rotation,
            } => self.on_join(conn_id, pseudo, position, rotation),
            ClientMsg::UpdatePosition {
                position,
                rotation,
                velocity,
                timestamp,
            } => self.on_update(conn_id, position, rotation, velocity, timestamp),
            ClientMsg::FireMissile {
                position,
                direction,
            } => self.on_fire(conn_id, position, direction, now),
            ClientMsg::MissileHit { target_id, damage } => {
                vec![Outbound::new(
                    Recipient::All,
                    ServerMsg::PlayerHit { target_id, damage },
                )]
            }
        }
    }

    fn on_join(
        &mut self,
        conn_id: Uuid,
        pseudo: String,
        position: Vector3,
        rotation: Vector3,
    ) -> Vec<Outbound> {
        let record = PlayerRecord {
            id: conn_id,
            pseudo: pseudo.trim().to_string(),
            position,
            rotation,
            velocity: None,
            last_timestamp: None,
        };
        let joined = record.info();
        self.store.upsert_player(record);

        info!(
            conn_id = %conn_id,
            pseudo = %joined.pseudo,
            player_count = self.store.player_count(),
            "Player joined"
        );

        let roster = self.store.players().iter().map(PlayerRecord::info).collect();

        vec![
            Outbound::new(Recipient::Only(conn_id), ServerMsg::Players(roster)),
            Outbound::new(Recipient::AllExcept(conn_id), ServerMsg::PlayerJoined(joined)),
        ]
    }

    fn on_update(
        &mut self,
        conn_id: Uuid,
        position: Vector3,
        rotation: Vector3,
        velocity: Vector3,
        timestamp: Option<u64>,
    ) -> Vec<Outbound> {
        let Some(player) = self.store.player_mut(&conn_id) else {
            debug!(conn_id = %conn_id, "Position update before join, ignoring");
            return Vec::new();
        };

        // Last write wins by sender timestamp
        if let (Some(incoming), Some(last)) = (timestamp, player.last_timestamp) {
            if incoming < last {
                debug!(conn_id = %conn_id, incoming, last, "Out-of-order position update dropped");
                return Vec::new();
            }
        }

        player.position = position;
        player.rotation = rotation;
        player.velocity = Some(velocity);
        if timestamp.is_some() {
            player.last_timestamp = timestamp;
        }

        vec![Outbound::new(
            Recipient::AllExcept(conn_id),
            ServerMsg::PlayerMoved(PlayerMoved {
                id: conn_id,
                position,
                rotation,
                velocity,
                timestamp,
            }),
        )]
    }

    fn on_fire(
        &mut self,
        conn_id: Uuid,
        position: Vector3,
        direction: Vector3,
        now: u64,
    ) -> Vec<Outbound> {
        self.missile_seq += 1;
        let missile_id = format!("{}-{}", now, self.missile_seq);

        self.store.insert_missile(MissileRecord {
            id: missile_id.clone(),
            player_id: conn_id,
            position,
            direction,
            fired_at: now,
        });

        debug!(conn_id = %conn_id, missile_id = %missile_id, "Missile fired");

        vec![Outbound::new(
            Recipient::All,
            ServerMsg::MissilesFired {
                missile_id,
                player_id: conn_id,
                position,
                direction,
            },
        )]
    }

    /// Connection closed; always announced, joined or not
    pub fn disconnect(&mut self, conn_id: Uuid) -> Vec<Outbound> {
        if let Some(player) = self.store.remove_player(&conn_id) {
            info!(conn_id = %conn_id, pseudo = %player.pseudo, "Player left");
        }

        vec![Outbound::new(
            Recipient::All,
            ServerMsg::PlayerDisconnected(conn_id),
        )]
    }

    /// Drop expired missile records
    pub fn sweep(&mut self, now: u64) -> usize {
        let purged = self.store.purge_missiles(now, self.missile_ttl_ms);
        if purged > 0 {
            debug!(purged, remaining = self.store.missile_count(), "Swept expired missiles");
        }
        purged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join(pseudo: &str) -> ClientMsg {
        ClientMsg::PlayerJoin {
            pseudo: pseudo.to_string(),
            position: Vector3::new(0.0, 100.0, 0.0),
            rotation: Vector3::default(),
        }
    }

    fn update(x: f32, timestamp: Option<u64>) -> ClientMsg {
        ClientMsg::UpdatePosition {
            position: Vector3::new(x, 50.0, 0.0),
            rotation: Vector3::default(),
            velocity: Vector3::new(0.0, 0.0, -1.0),
            timestamp,
        }
    }

    #[test]
    fn first_join_gets_roster_of_one() {
        let mut relay = RelayState::in_memory(5_000);
        let a = Uuid::new_v4();

        let out = relay.handle(a, join("Ace"), 0);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].to, Recipient::Only(a));
        match &out[0].msg {
            ServerMsg::Players(roster) => {
                assert_eq!(roster.len(), 1);
                assert_eq!(roster[0].id, a);
                assert_eq!(roster[0].pseudo, "Ace");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(out[1].to, Recipient::AllExcept(a));
        assert!(matches!(out[1].msg, ServerMsg::PlayerJoined(ref p) if p.id == a));
    }

    #[test]
    fn every_update_is_broadcast() {
        let mut relay = RelayState::in_memory(5_000);
        let a = Uuid::new_v4();
        relay.handle(a, join("Ace"), 0);

        let first = relay.handle(a, update(1.0, None), 1);
        let second = relay.handle(a, update(1.0, None), 2);

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(first, second);
        assert_eq!(first[0].to, Recipient::AllExcept(a));
    }

    #[test]
    fn update_before_join_is_ignored() {
        let mut relay = RelayState::in_memory(5_000);
        let out = relay.handle(Uuid::new_v4(), update(1.0, None), 0);
        assert!(out.is_empty());
        assert_eq!(relay.store().player_count(), 0);
    }

    #[test]
    fn stale_update_is_dropped() {
        let mut relay = RelayState::in_memory(5_000);
        let a = Uuid::new_v4();
        relay.handle(a, join("Ace"), 0);

        assert_eq!(relay.handle(a, update(5.0, Some(200)), 0).len(), 1);
        assert!(relay.handle(a, update(1.0, Some(100)), 0).is_empty());
        assert_eq!(relay.store().player(&a).unwrap().position.x, 5.0);

        // Equal timestamps still win
        assert_eq!(relay.handle(a, update(6.0, Some(200)), 0).len(), 1);
        // Untimestamped updates are applied in receipt order
        assert_eq!(relay.handle(a, update(7.0, None), 0).len(), 1);
        assert_eq!(relay.store().player(&a).unwrap().position.x, 7.0);
    }

    #[test]
    fn missiles_go_to_everyone_and_expire() {
        let mut relay = RelayState::in_memory(5_000);
        let a = Uuid::new_v4();

        let out = relay.handle(
            a,
            ClientMsg::FireMissile {
                position: Vector3::new(0.0, 10.0, -10.0),
                direction: Vector3::new(0.0, 0.0, -1.0),
            },
            10_000,
        );
        assert_eq!(out[0].to, Recipient::All);
        let ServerMsg::MissilesFired { missile_id, player_id, .. } = &out[0].msg else {
            panic!("unexpected {:?}", out[0].msg);
        };
        assert_eq!(*player_id, a);
        assert!(missile_id.starts_with("10000-"));

        for t in [11_000, 12_000, 13_000, 14_000, 15_000] {
            assert_eq!(relay.sweep(t), 0, "purged too early at {}", t);
        }
        assert_eq!(relay.sweep(16_000), 1);
        assert_eq!(relay.store().missile_count(), 0);
    }

    #[test]
    fn same_millisecond_missiles_get_distinct_ids() {
        let mut relay = RelayState::in_memory(5_000);
        let a = Uuid::new_v4();
        let fire = ClientMsg::FireMissile {
            position: Vector3::default(),
            direction: Vector3::new(1.0, 0.0, 0.0),
        };
        relay.handle(a, fire.clone(), 42);
        relay.handle(a, fire, 42);
        assert_eq!(relay.store().missile_count(), 2);
    }

    #[test]
    fn hits_are_relayed_unvalidated() {
        let mut relay = RelayState::in_memory(5_000);
        let target = Uuid::new_v4();
        let out = relay.handle(
            Uuid::new_v4(),
            ClientMsg::MissileHit {
                target_id: target,
                damage: 25.0,
            },
            0,
        );
        assert_eq!(
            out,
            vec![Outbound {
                to: Recipient::All,
                msg: ServerMsg::PlayerHit {
                    target_id: target,
                    damage: 25.0
                },
            }]
        );
    }

    #[test]
    fn disconnect_removes_and_announces() {
        let mut relay = RelayState::in_memory(5_000);
        let a = Uuid::new_v4();
        relay.handle(a, join("Ace"), 0);

        let out = relay.disconnect(a);
        assert_eq!(relay.store().player_count(), 0);
        assert_eq!(out[0].msg, ServerMsg::PlayerDisconnected(a));
        assert_eq!(out[0].to, Recipient::All);
    }
}
