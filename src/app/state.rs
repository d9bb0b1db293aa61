//! Application state shared across routes

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::relay::{ConnectionRegistry, RelayHandle, RelayHub, RelayState};
use crate::store::MemoryStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub connections: Arc<ConnectionRegistry>,
    pub relay: RelayHandle,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Build the state together with the relay loop it talks to.
    /// The caller is responsible for spawning `RelayHub::run`.
    pub fn new(config: Config) -> (Self, RelayHub<MemoryStore>) {
        let config = Arc::new(config);

        let connections = Arc::new(ConnectionRegistry::new());

        let (hub, relay) = RelayHub::new(
            RelayState::in_memory(config.missile_ttl_ms),
            connections.clone(),
            Duration::from_millis(config.missile_sweep_ms),
        );

        let state = Self {
            config,
            connections,
            relay,
            started_at: Utc::now(),
        };

        (state, hub)
    }
}
