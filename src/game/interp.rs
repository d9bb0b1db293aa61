//! Remote-player interpolation.
//!
//! Remote clients broadcast discrete snapshots at roughly the nominal
//! update interval. The local client renders at its own rate and slides
//! each remote entity from its previous transform towards the latest
//! target. Rotation is interpolated per Euler component, which is cheap
//! but can take the long way round near ±π.

use std::collections::HashMap;

use glam::Vec3;
use uuid::Uuid;

/// Position + Euler rotation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Transform {
    pub fn lerp(&self, to: &Transform, t: f32) -> Transform {
        let t = t.clamp(0.0, 1.0);
        Transform {
            position: self.position.lerp(to.position, t),
            rotation: self.rotation.lerp(to.rotation, t),
        }
    }
}

/// A timestamped sample received for a remote entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemoteSnapshot {
    pub entity_id: Uuid,
    pub transform: Transform,
    /// Sender clock (unix ms), when the sender provided one
    pub timestamp: Option<u64>,
}

#[derive(Debug, Clone)]
struct InterpolationState {
    previous: Transform,
    target: RemoteSnapshot,
    received_at: u64,
    /// Newest sender timestamp seen for this entity
    latest_timestamp: Option<u64>,
}

impl InterpolationState {
    fn transform_at(&self, now: u64, nominal_interval_ms: u64) -> Transform {
        let elapsed = now.saturating_sub(self.received_at) as f32;
        let progress = (elapsed / nominal_interval_ms.max(1) as f32).clamp(0.0, 1.0);
        if progress >= 1.0 {
            return self.target.transform;
        }
        self.previous.lerp(&self.target.transform, progress)
    }
}

/// Per-entity interpolation buffers
#[derive(Debug)]
pub struct Interpolator {
    entities: HashMap<Uuid, InterpolationState>,
    nominal_interval_ms: u64,
    stale_after_ms: u64,
}

impl Interpolator {
    pub fn new(nominal_interval_ms: u64, stale_after_ms: u64) -> Self {
        Self {
            entities: HashMap::new(),
            nominal_interval_ms,
            stale_after_ms,
        }
    }

    /// Feed a snapshot received at `now`. Returns false if it was dropped
    /// for being older than the newest timestamped snapshot already seen.
    /// Untimestamped snapshots are applied in receipt order.
    pub fn receive(&mut self, snapshot: RemoteSnapshot, now: u64) -> bool {
        let interval = self.nominal_interval_ms;
        match self.entities.get_mut(&snapshot.entity_id) {
            Some(state) => {
                if let (Some(incoming), Some(latest)) =
                    (snapshot.timestamp, state.latest_timestamp)
                {
                    if incoming < latest {
                        return false;
                    }
                }
                state.previous = state.transform_at(now, interval);
                state.target = snapshot;
                state.received_at = now;
                if snapshot.timestamp.is_some() {
                    state.latest_timestamp = snapshot.timestamp;
                }
            }
            None => {
                // First sighting: appear in place instead of sliding in
                self.entities.insert(
                    snapshot.entity_id,
                    InterpolationState {
                        previous: snapshot.transform,
                        target: snapshot,
                        received_at: now,
                        latest_timestamp: snapshot.timestamp,
                    },
                );
            }
        }
        true
    }

    /// Rendered transform of one entity at `now`
    pub fn transform_at(&self, id: &Uuid, now: u64) -> Option<Transform> {
        self.entities
            .get(id)
            .map(|s| s.transform_at(now, self.nominal_interval_ms))
    }

    /// Rendered transforms of every entity at `now`
    pub fn render(&self, now: u64) -> Vec<(Uuid, Transform)> {
        self.entities
            .iter()
            .map(|(id, s)| (*id, s.transform_at(now, self.nominal_interval_ms)))
            .collect()
    }

    pub fn remove(&mut self, id: &Uuid) -> bool {
        self.entities.remove(id).is_some()
    }

    /// Keep only the listed entities
    pub fn retain_ids(&mut self, ids: &[Uuid]) -> Vec<Uuid> {
        let gone: Vec<Uuid> = self
            .entities
            .keys()
            .filter(|id| !ids.contains(id))
            .copied()
            .collect();
        for id in &gone {
            self.entities.remove(id);
        }
        gone
    }

    /// Drop entities that have not been heard from in `stale_after_ms`
    pub fn prune_stale(&mut self, now: u64) -> Vec<Uuid> {
        let stale_after = self.stale_after_ms;
        let stale: Vec<Uuid> = self
            .entities
            .iter()
            .filter(|(_, s)| now.saturating_sub(s.received_at) > stale_after)
            .map(|(id, _)| *id)
            .collect();
        for id in &stale {
            self.entities.remove(id);
        }
        stale
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
