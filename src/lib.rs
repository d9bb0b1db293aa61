//! Sky Arena - flight core and real-time relay for a multiplayer flight arcade game
//!
//! - `game`: client-side flight simulation (physics, landing, controls,
//!   terrain, remote-player interpolation)
//! - `relay`, `ws`, `http`: the WebSocket relay server
//! - `store`: in-memory player and missile records

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod relay;
pub mod store;
pub mod util;
pub mod ws;
