//! Time utilities

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Expected period between two position updates from a client (~60 Hz)
pub const NOMINAL_UPDATE_INTERVAL_MS: u64 = 16;

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Millisecond clock anchored to the wall clock at creation and advanced by
/// tokio's monotonic timer (so paused-time tests move it too)
#[derive(Debug, Clone, Copy)]
pub struct RelayClock {
    epoch_ms: u64,
    started: tokio::time::Instant,
}

impl RelayClock {
    pub fn new() -> Self {
        Self::starting_at(unix_millis())
    }

    pub fn starting_at(epoch_ms: u64) -> Self {
        Self {
            epoch_ms,
            started: tokio::time::Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.epoch_ms + self.started.elapsed().as_millis() as u64
    }
}

impl Default for RelayClock {
    fn default() -> Self {
        Self::new()
    }
}
