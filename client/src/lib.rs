//! Per-connection client: reads keyboard bytes, drives the session state
//! machine, and renders world snapshots to the terminal at ~60 Hz.

mod client;
mod screen;
mod session;
mod state;
mod stream;

pub use client::Client;
pub use session::{Session, SessionReader, SessionWriter};
pub use state::{ClientState, GameState};
pub use stream::InputStream;
