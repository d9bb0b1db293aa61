//! WebSocket transport and wire protocol

pub mod handler;
pub mod protocol;

pub use handler::ws_handler;
pub use protocol::{ClientMsg, PlayerInfo, PlayerMoved, ProtocolError, ServerMsg, Vector3};
