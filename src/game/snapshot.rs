//! Outbound position snapshots, throttled to the nominal update interval

use crate::ws::protocol::ClientMsg;

use super::ship::ShipState;

/// Builds `updatePosition` messages for network transmission
pub struct SnapshotBuilder {
    /// Minimum time between two snapshots (ms)
    interval_ms: u64,
    /// When the last snapshot went out
    last_sent_ms: Option<u64>,
}

impl SnapshotBuilder {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_sent_ms: None,
        }
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&self, now: u64) -> bool {
        match self.last_sent_ms {
            Some(last) => now.saturating_sub(last) >= self.interval_ms,
            None => true,
        }
    }

    /// Force snapshot on next check (used after respawns)
    pub fn force_next(&mut self) {
        self.last_sent_ms = None;
    }

    /// Build a snapshot message and mark it sent
    pub fn build(&mut self, ship: &ShipState, now: u64) -> ClientMsg {
        self.last_sent_ms = Some(now);
        ClientMsg::UpdatePosition {
            position: ship.position.into(),
            rotation: ship.rotation.into(),
            velocity: ship.velocity.into(),
            timestamp: Some(now),
        }
    }

    /// Build a snapshot only if the interval has elapsed
    pub fn poll(&mut self, ship: &ShipState, now: u64) -> Option<ClientMsg> {
        if self.should_send(now) {
            Some(self.build(ship, now))
        } else {
            None
        }
    }
}
