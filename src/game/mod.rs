//! Client-side flight simulation core

pub mod audio;
pub mod controls;
pub mod interp;
pub mod landing;
pub mod physics;
pub mod session;
pub mod ship;
pub mod snapshot;
pub mod terrain;

pub use audio::{play_cues, AudioError, AudioSink, Cue};
pub use controls::ControlState;
pub use interp::{Interpolator, RemoteSnapshot, Transform};
pub use landing::{FlightStatus, LandingClassifier};
pub use physics::{FlightConstants, Forces, PhysicsSystem};
pub use session::{FlightSession, SessionConfig, SessionEvent, TickReport};
pub use ship::ShipState;
pub use snapshot::SnapshotBuilder;
pub use terrain::{FlatTerrain, HeightField, Terrain};
