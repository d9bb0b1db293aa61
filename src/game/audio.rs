//! Audio cue triggers emitted by the flight core

use tracing::warn;

/// Discrete named sound triggers consumed by the audio layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    /// Soft landing
    Touchdown,
    /// Crash, or knocked back to the pad by a hit
    Explosion,
    /// Local ship struck by a missile
    Hit,
    /// Engine spooled up (takeoff)
    EngineBoostOn,
    /// Engine cut after boosting
    EngineBoostOff,
    /// Precision (slow rotation) mode engaged
    PrecisionMode,
    /// Manual reset to the launch pad
    Warp,
    /// Local missile fired
    MissileLaunch,
}

impl Cue {
    pub fn name(&self) -> &'static str {
        match self {
            Cue::Touchdown => "touchdown",
            Cue::Explosion => "explosion",
            Cue::Hit => "hit",
            Cue::EngineBoostOn => "engine-boost-on",
            Cue::EngineBoostOff => "engine-boost-off",
            Cue::PrecisionMode => "precision-mode",
            Cue::Warp => "warp",
            Cue::MissileLaunch => "missile-launch",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("Sound not loaded: {0}")]
    NotLoaded(&'static str),

    #[error("Playback failed: {0}")]
    Playback(String),
}

/// Audio backend driven by the client
pub trait AudioSink {
    fn play(&mut self, cue: Cue) -> Result<(), AudioError>;
}

/// Play every cue; failures are logged and otherwise ignored
pub fn play_cues<A: AudioSink + ?Sized>(sink: &mut A, cues: &[Cue]) {
    for cue in cues {
        if let Err(e) = sink.play(*cue) {
            warn!(cue = cue.name(), error = %e, "Audio playback failed");
        }
    }
}
