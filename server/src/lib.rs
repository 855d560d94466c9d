//! Authoritative game server: owns the world, integrates entities, resolves
//! collisions and publishes per-tick snapshots for client render loops.

pub mod collision;
pub mod config;
mod server;
mod state;

pub use server::{ClientEvent, ClientHandle, GameLoop, Server, ServerConfig};
pub use state::{TopScoreEntry, UpdateFailure, WorldSnapshot, WorldState};
