//! # Shared Game Library
//!
//! This crate contains everything both the authoritative server and the
//! per-connection client loops need: geometry and toroidal-wrap math, the
//! spatial hash grid used for broad-phase collision detection, the keyboard
//! decoder, the game entities themselves, the half-block terminal canvas and
//! the chunked ANSI writer, plus the tuning table.
//!
//! ## Core Components
//!
//! - [`geometry`]: points, world bounds, wrapping, circle tests, the camera
//!   and the world-to-screen transform that duplicates objects straddling
//!   the toroidal edge.
//! - [`grid`]: a uniform spatial hash with a wrapping 3x3 neighborhood query.
//! - [`input`]: byte-level keyboard classification with a sliding
//!   "recently pressed" window so bursty terminal autorepeat reads as held
//!   keys.
//! - [`object`]: the entity sum type (ship, projectile, asteroid, particle,
//!   asteroid spawner) with `update`/`draw` behavior.
//! - [`draw`]: the sub-pixel canvas (2x vertical resolution via half-block
//!   glyphs, diff-based rendering) and the MTU-sized chunk writer.
//! - [`tuning`]: every gameplay and runtime constant in one place.
//!
//! The crate is runtime-free on purpose: no async, no I/O. The server and
//! client crates own the tasks, channels and sockets.

pub mod draw;
pub mod geometry;
pub mod grid;
pub mod input;
pub mod object;
pub mod tuning;

pub use geometry::{Bounds, Camera, Point};
pub use input::Input;
pub use object::GameObject;
