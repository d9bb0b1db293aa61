//! Multiplayer relay: state machine, connection registry and event loop

pub mod hub;
pub mod registry;
pub mod state;

pub use hub::{RelayEvent, RelayHandle, RelayHub, RelayStats};
pub use registry::{ConnectionHandle, ConnectionRegistry};
pub use state::{Outbound, Recipient, RelayState};
