//! Flight session: everything one client simulates, in one place

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::util::time::NOMINAL_UPDATE_INTERVAL_MS;
use crate::ws::protocol::{ClientMsg, PlayerInfo, ServerMsg};

use super::audio::Cue;
use super::controls::{self, ControlState};
use super::interp::{Interpolator, RemoteSnapshot, Transform};
use super::landing::{FlightStatus, LandingClassifier};
use super::physics::{FlightConstants, PhysicsSystem};
use super::ship::ShipState;
use super::snapshot::SnapshotBuilder;
use super::terrain::{HeightField, Terrain};

/// Missiles spawn this far ahead of the nose
pub const MISSILE_SPAWN_OFFSET: f32 = 10.0;
/// Chance that an incoming hit knocks the ship back to the pad
pub const HIT_RESET_CHANCE: f64 = 0.3;
/// Remote entities silent for this long are dropped
pub const DEFAULT_STALE_AFTER_MS: u64 = 10_000;

/// Session setup
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub pseudo: String,
    /// Terrain and gameplay RNG seed
    pub seed: u64,
    pub constants: FlightConstants,
    pub update_interval_ms: u64,
    pub stale_after_ms: u64,
}

impl SessionConfig {
    pub fn new(pseudo: impl Into<String>, seed: u64) -> Self {
        Self {
            pseudo: pseudo.into(),
            seed,
            constants: FlightConstants::default(),
            update_interval_ms: NOMINAL_UPDATE_INTERVAL_MS,
            stale_after_ms: DEFAULT_STALE_AFTER_MS,
        }
    }
}

/// Result of one simulation tick
#[derive(Debug, Clone)]
pub struct TickReport {
    pub status: FlightStatus,
    pub cues: Vec<Cue>,
    /// Messages to send to the relay
    pub outbound: Vec<ClientMsg>,
}

/// Side effects of a relay message, for the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Cue(Cue),
    RemoteJoined { id: Uuid, pseudo: String },
    RemoteLeft(Uuid),
    MissileIncoming { position: Vec3, direction: Vec3 },
}

/// Per-client simulation context
pub struct FlightSession<H: HeightField = Terrain> {
    pseudo: String,
    constants: FlightConstants,
    terrain: H,
    ship: ShipState,
    status: FlightStatus,
    previous_controls: ControlState,
    snapshots: SnapshotBuilder,
    remotes: Interpolator,
    local_id: Option<Uuid>,
    rng: ChaCha8Rng,
}

impl FlightSession<Terrain> {
    pub fn new(config: SessionConfig) -> Self {
        let terrain = Terrain::new(config.seed);
        Self::with_terrain(config, terrain)
    }
}

impl<H: HeightField> FlightSession<H> {
    pub fn with_terrain(config: SessionConfig, terrain: H) -> Self {
        let constants = config.constants;
        Self {
            pseudo: config.pseudo,
            constants,
            terrain,
            ship: ShipState::at_launch_pad(constants.landing_altitude()),
            status: FlightStatus::Landed,
            previous_controls: ControlState::default(),
            snapshots: SnapshotBuilder::new(config.update_interval_ms),
            remotes: Interpolator::new(config.update_interval_ms, config.stale_after_ms),
            local_id: None,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
        }
    }

    pub fn ship(&self) -> &ShipState {
        &self.ship
    }

    pub fn status(&self) -> FlightStatus {
        self.status
    }

    pub fn local_id(&self) -> Option<Uuid> {
        self.local_id
    }

    pub fn remotes(&self) -> &Interpolator {
        &self.remotes
    }

    pub fn terrain(&self) -> &H {
        &self.terrain
    }

    /// First message to send once connected
    pub fn join_message(&self) -> ClientMsg {
        ClientMsg::PlayerJoin {
            pseudo: self.pseudo.clone(),
            position: self.ship.position.into(),
            rotation: self.ship.rotation.into(),
        }
    }

    /// Advance the local simulation by one frame
    pub fn tick(&mut self, controls: &ControlState, now: u64) -> TickReport {
        let mut cues = Vec::new();
        let mut outbound = Vec::new();

        let mut previous = self.status;

        controls::steer(&mut self.ship, controls);
        controls::throttle(&mut self.ship, controls, &self.previous_controls, &mut cues);

        // Reset wins over this tick's attitude and engine inputs
        if controls.reset {
            self.ship.reset_to_launch_pad(self.constants.landing_altitude());
            self.snapshots.force_next();
            cues.push(Cue::Warp);
            previous = FlightStatus::Landed;
        }

        PhysicsSystem::step(&mut self.ship, &self.constants);

        let status = LandingClassifier::apply(
            &mut self.ship,
            &self.terrain,
            &self.constants,
            previous,
            &mut cues,
        );
        if status == FlightStatus::Crashed {
            debug!("Ship crashed, respawned on launch pad");
            self.snapshots.force_next();
        }

        if controls.fire {
            let direction = self.ship.forward();
            let position = self.ship.position + direction * MISSILE_SPAWN_OFFSET;
            outbound.push(ClientMsg::FireMissile {
                position: position.into(),
                direction: direction.into(),
            });
            cues.push(Cue::MissileLaunch);
        }

        if let Some(update) = self.snapshots.poll(&self.ship, now) {
            outbound.push(update);
        }

        self.previous_controls = controls.clone();
        self.status = status;

        TickReport {
            status,
            cues,
            outbound,
        }
    }

    /// Apply one relay message
    pub fn handle(&mut self, msg: ServerMsg, now: u64) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        match msg {
            ServerMsg::Welcome { id, .. } => {
                self.local_id = Some(id);
            }
            ServerMsg::Players(players) => {
                let ids: Vec<Uuid> = players
                    .iter()
                    .map(|p| p.id)
                    .filter(|id| !self.is_local(id))
                    .collect();
                for gone in self.remotes.retain_ids(&ids) {
                    events.push(SessionEvent::RemoteLeft(gone));
                }
                for info in players {
                    if let Some(event) = self.upsert_remote(info, now) {
                        events.push(event);
                    }
                }
            }
            ServerMsg::PlayerJoined(info) => {
                if let Some(event) = self.upsert_remote(info, now) {
                    events.push(event);
                }
            }
            ServerMsg::PlayerMoved(moved) => {
                // Unknown ids have not been announced yet
                if !self.is_local(&moved.id) && self.remotes.contains(&moved.id) {
                    self.remotes.receive(
                        RemoteSnapshot {
                            entity_id: moved.id,
                            transform: Transform {
                                position: moved.position.into(),
                                rotation: moved.rotation.into(),
                            },
                            timestamp: moved.timestamp,
                        },
                        now,
                    );
                }
            }
            ServerMsg::MissilesFired {
                player_id,
                position,
                direction,
                ..
            } => {
                if !self.is_local(&player_id) {
                    events.push(SessionEvent::MissileIncoming {
                        position: position.into(),
                        direction: direction.into(),
                    });
                }
            }
            ServerMsg::PlayerHit { target_id, damage } => {
                if self.is_local(&target_id) {
                    debug!(damage, "Local ship hit");
                    events.push(SessionEvent::Cue(Cue::Hit));
                    if self.rng.gen_bool(HIT_RESET_CHANCE) {
                        events.push(SessionEvent::Cue(Cue::Explosion));
                        self.ship
                            .reset_to_launch_pad(self.constants.landing_altitude());
                        self.snapshots.force_next();
                    }
                }
            }
            ServerMsg::PlayerDisconnected(id) => {
                if self.remotes.remove(&id) {
                    events.push(SessionEvent::RemoteLeft(id));
                }
            }
            ServerMsg::Error { code, message } => {
                warn!(code = %code, message = %message, "Relay rejected a message");
            }
        }

        events
    }

    /// Interpolated remote transforms for this frame; silent entities are dropped
    pub fn render_remotes(&mut self, now: u64) -> Vec<(Uuid, Transform)> {
        for id in self.remotes.prune_stale(now) {
            debug!(entity_id = %id, "Dropping stale remote player");
        }
        self.remotes.render(now)
    }

    fn is_local(&self, id: &Uuid) -> bool {
        self.local_id.as_ref() == Some(id)
    }

    fn upsert_remote(&mut self, info: PlayerInfo, now: u64) -> Option<SessionEvent> {
        if self.is_local(&info.id) {
            return None;
        }

        let is_new = !self.remotes.contains(&info.id);
        self.remotes.receive(
            RemoteSnapshot {
                entity_id: info.id,
                transform: Transform {
                    position: info.position.into(),
                    rotation: info.rotation.into(),
                },
                timestamp: None,
            },
            now,
        );

        is_new.then(|| SessionEvent::RemoteJoined {
            id: info.id,
            pseudo: info.pseudo,
        })
    }
}
