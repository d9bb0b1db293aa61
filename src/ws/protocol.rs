//! WebSocket protocol message definitions
//! These are the wire types for client-server communication.
//!
//! Every frame is a JSON text message shaped `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest accepted pseudo, in characters
pub const MAX_PSEUDO_LEN: usize = 32;

/// Plain `{x, y, z}` vector as sent by clients
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<glam::Vec3> for Vector3 {
    fn from(v: glam::Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Vector3> for glam::Vec3 {
    fn from(v: Vector3) -> Self {
        glam::Vec3::new(v.x, v.y, v.z)
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Enter the shared world
    PlayerJoin {
        pseudo: String,
        position: Vector3,
        /// Euler angles (radians)
        rotation: Vector3,
    },

    /// Periodic position broadcast (self-throttled by the client)
    UpdatePosition {
        position: Vector3,
        rotation: Vector3,
        velocity: Vector3,
        /// Client clock (unix ms) at send time, used for last-write-wins
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<u64>,
    },

    /// Missile launched
    FireMissile {
        position: Vector3,
        direction: Vector3,
    },

    /// Client-side hit detection result (trusted as-is)
    #[serde(rename_all = "camelCase")]
    MissileHit {
        target_id: Uuid,
        damage: f32,
    },
}

impl ClientMsg {
    /// Decode and validate a text frame
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let msg: ClientMsg = serde_json::from_str(text)?;
        msg.validate()?;
        Ok(msg)
    }

    /// Reject payloads that would put undefined state into the relay
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            ClientMsg::PlayerJoin {
                pseudo,
                position,
                rotation,
            } => {
                let trimmed = pseudo.trim();
                if trimmed.is_empty() {
                    return Err(ProtocolError::invalid("pseudo", "must not be empty"));
                }
                if trimmed.chars().count() > MAX_PSEUDO_LEN {
                    return Err(ProtocolError::invalid("pseudo", "too long"));
                }
                finite("position", position)?;
                finite("rotation", rotation)?;
            }
            ClientMsg::UpdatePosition {
                position,
                rotation,
                velocity,
                ..
            } => {
                finite("position", position)?;
                finite("rotation", rotation)?;
                finite("velocity", velocity)?;
            }
            ClientMsg::FireMissile {
                position,
                direction,
            } => {
                finite("position", position)?;
                finite("direction", direction)?;
            }
            ClientMsg::MissileHit { damage, .. } => {
                if !damage.is_finite() {
                    return Err(ProtocolError::invalid("damage", "must be a finite number"));
                }
            }
        }
        Ok(())
    }

    /// Event name as it appears on the wire
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientMsg::PlayerJoin { .. } => "playerJoin",
            ClientMsg::UpdatePosition { .. } => "updatePosition",
            ClientMsg::FireMissile { .. } => "fireMissile",
            ClientMsg::MissileHit { .. } => "missileHit",
        }
    }
}

fn finite(field: &'static str, v: &Vector3) -> Result<(), ProtocolError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(ProtocolError::invalid(field, "must contain finite numbers"))
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Sent once after the socket opens; tells the client its own id
    #[serde(rename_all = "camelCase")]
    Welcome { id: Uuid, server_time: u64 },

    /// Full roster, sent to a player right after it joins
    Players(Vec<PlayerInfo>),

    /// Someone else joined
    PlayerJoined(PlayerInfo),

    /// Someone else moved
    PlayerMoved(PlayerMoved),

    /// A missile was fired (sent to everyone, sender included)
    #[serde(rename_all = "camelCase")]
    MissilesFired {
        missile_id: String,
        player_id: Uuid,
        position: Vector3,
        direction: Vector3,
    },

    /// A hit was reported
    #[serde(rename_all = "camelCase")]
    PlayerHit { target_id: Uuid, damage: f32 },

    /// Connection id of the player that left
    PlayerDisconnected(Uuid),

    /// Rejected client message
    Error { code: String, message: String },
}

/// Player info for the roster and join notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: Uuid,
    pub pseudo: String,
    pub position: Vector3,
    pub rotation: Vector3,
}

/// Position relay payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMoved {
    pub id: Uuid,
    pub position: Vector3,
    pub rotation: Vector3,
    pub velocity: Vector3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

/// Protocol errors
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid field `{field}`: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },
}

impl ProtocolError {
    fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::InvalidField { field, reason }
    }

    /// Short machine-readable code for error replies
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolError::Malformed(_) => "malformed",
            ProtocolError::InvalidField { .. } => "invalid_field",
        }
    }
}
