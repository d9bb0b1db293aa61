//! Relay event loop.
//!
//! A single task owns the relay state and handles one event at a time,
//! so the player and missile stores never see concurrent mutation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::store::{MemoryStore, RelayStore};
use crate::util::time::RelayClock;
use crate::ws::protocol::ClientMsg;

use super::registry::ConnectionRegistry;
use super::state::RelayState;

/// Pending events the relay loop may fall behind by before frames are dropped
pub const RELAY_QUEUE_CAPACITY: usize = 4096;

/// Events fed to the relay loop by connection tasks
#[derive(Debug, Clone)]
pub enum RelayEvent {
    Message { conn_id: Uuid, msg: ClientMsg },
    Disconnected { conn_id: Uuid },
}

/// Counters readable outside the loop (health endpoint)
#[derive(Debug, Default)]
pub struct RelayStats {
    players: AtomicUsize,
    missiles: AtomicUsize,
}

impl RelayStats {
    pub fn players(&self) -> usize {
        self.players.load(Ordering::Relaxed)
    }

    pub fn missiles(&self) -> usize {
        self.missiles.load(Ordering::Relaxed)
    }
}

/// Cloneable sender side of the relay loop
#[derive(Clone)]
pub struct RelayHandle {
    events_tx: mpsc::Sender<RelayEvent>,
    pub stats: Arc<RelayStats>,
}

impl RelayHandle {
    /// Forward a client message without waiting on the relay. A frame that
    /// finds the queue full is dropped; the next update supersedes it.
    /// Returns false once the relay has stopped.
    pub fn message(&self, conn_id: Uuid, msg: ClientMsg) -> bool {
        match self.events_tx.try_send(RelayEvent::Message { conn_id, msg }) {
            Ok(()) => true,
            Err(TrySendError::Full(RelayEvent::Message { msg, .. })) => {
                warn!(conn_id = %conn_id, event = msg.event_name(), "Relay queue full, dropping frame");
                true
            }
            Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Lifecycle events are never dropped, so this one waits for room
    pub async fn disconnect(&self, conn_id: Uuid) -> bool {
        self.events_tx
            .send(RelayEvent::Disconnected { conn_id })
            .await
            .is_ok()
    }
}

/// The relay loop
pub struct RelayHub<S: RelayStore = MemoryStore> {
    state: RelayState<S>,
    events_rx: mpsc::Receiver<RelayEvent>,
    connections: Arc<ConnectionRegistry>,
    sweep_every: Duration,
    clock: RelayClock,
    stats: Arc<RelayStats>,
}

impl<S: RelayStore> RelayHub<S> {
    pub fn new(
        state: RelayState<S>,
        connections: Arc<ConnectionRegistry>,
        sweep_every: Duration,
    ) -> (Self, RelayHandle) {
        let (events_tx, events_rx) = mpsc::channel(RELAY_QUEUE_CAPACITY);
        let stats = Arc::new(RelayStats::default());

        let handle = RelayHandle {
            events_tx,
            stats: stats.clone(),
        };

        let hub = Self {
            state,
            events_rx,
            connections,
            sweep_every,
            clock: RelayClock::new(),
            stats,
        };

        (hub, handle)
    }

    /// Run until every handle has been dropped
    pub async fn run(mut self) {
        info!(sweep_ms = self.sweep_every.as_millis() as u64, "Relay started");

        let mut sweep = interval(self.sweep_every);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                event = self.events_rx.recv() => {
                    match event {
                        Some(event) => self.process(event),
                        None => break,
                    }
                }
                _ = sweep.tick() => {
                    self.state.sweep(self.clock.now_ms());
                    self.publish_stats();
                }
            }
        }

        info!("Relay stopped");
    }

    fn process(&mut self, event: RelayEvent) {
        let outbound = match event {
            RelayEvent::Message { conn_id, msg } => {
                debug!(conn_id = %conn_id, event = msg.event_name(), "Relaying");
                self.state.handle(conn_id, msg, self.clock.now_ms())
            }
            RelayEvent::Disconnected { conn_id } => self.state.disconnect(conn_id),
        };

        for out in outbound {
            self.connections.deliver(out);
        }

        self.publish_stats();
    }

    fn publish_stats(&self) {
        let store = self.state.store();
        self.stats
            .players
            .store(store.player_count(), Ordering::Relaxed);
        self.stats
            .missiles
            .store(store.missile_count(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::{ServerMsg, Vector3};

    fn fire() -> ClientMsg {
        ClientMsg::FireMissile {
            position: Vector3::default(),
            direction: Vector3::new(0.0, 0.0, -1.0),
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn missile_records_expire_between_five_and_six_seconds() {
        let connections = Arc::new(ConnectionRegistry::new());
        let (hub, handle) = RelayHub::new(
            RelayState::in_memory(5_000),
            connections.clone(),
            Duration::from_millis(1_000),
        );
        tokio::spawn(hub.run());

        let shooter = Uuid::new_v4();
        let mut rx = connections.register(shooter);
        assert!(handle.message(shooter, fire()));
        settle().await;

        assert!(matches!(rx.recv().await, Some(ServerMsg::MissilesFired { .. })));
        assert_eq!(handle.stats.missiles(), 1);

        tokio::time::advance(Duration::from_millis(4_990)).await;
        settle().await;
        assert_eq!(handle.stats.missiles(), 1, "purged before 5s");

        tokio::time::advance(Duration::from_millis(1_010)).await;
        settle().await;
        assert_eq!(handle.stats.missiles(), 0, "still stored after 6s");
    }

    #[tokio::test]
    async fn full_queue_drops_frames_instead_of_blocking() {
        let connections = Arc::new(ConnectionRegistry::new());
        let (hub, handle) = RelayHub::new(
            RelayState::in_memory(5_000),
            connections,
            Duration::from_millis(1_000),
        );

        // Loop not running: nothing drains the queue
        let shooter = Uuid::new_v4();
        for _ in 0..RELAY_QUEUE_CAPACITY + 10 {
            assert!(handle.message(shooter, fire()));
        }

        drop(hub);
        assert!(!handle.message(shooter, fire()));
    }

    #[tokio::test]
    async fn disconnect_reaches_remaining_players() {
        let connections = Arc::new(ConnectionRegistry::new());
        let (hub, handle) = RelayHub::new(
            RelayState::in_memory(5_000),
            connections.clone(),
            Duration::from_millis(1_000),
        );
        tokio::spawn(hub.run());

        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let _rx_a = connections.register(a);
        let mut rx_b = connections.register(b);

        connections.unregister(&a);
        assert!(handle.disconnect(a).await);

        assert_eq!(rx_b.recv().await, Some(ServerMsg::PlayerDisconnected(a)));
    }
}
