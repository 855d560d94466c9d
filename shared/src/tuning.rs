//! Centralized tuning table for every gameplay and runtime constant.

use std::time::Duration;

// View resolution: the visible viewport in logical units. The horizontal
// unit is one terminal column, the vertical unit is one sub-pixel (half a
// terminal row), so 120x80 renders natively on a 120x40 cell terminal.
pub const VIEW_WIDTH: f64 = 120.0;
pub const VIEW_HEIGHT: f64 = 80.0;

// World dimensions: the total game area, larger than the viewport. The
// camera follows the ship; coordinates wrap at these bounds.
pub const WORLD_WIDTH: f64 = 400.0;
pub const WORLD_HEIGHT: f64 = 300.0;

// Max render resolution. Terminals larger than this get a centered render
// area with a box border around it.
pub const MAX_TERM_WIDTH: usize = 120;
pub const MAX_TERM_HEIGHT: usize = 40;

// Terminal cells are roughly twice as tall as wide; x extents of drawn
// shapes are stretched by this factor to compensate.
pub const TERMINAL_ASPECT: f64 = 2.0;

// Scoring. Smaller asteroids are faster and harder to hit.
pub const SCORE_LARGE_ASTEROID: i64 = 20;
pub const SCORE_MEDIUM_ASTEROID: i64 = 50;
pub const SCORE_SMALL_ASTEROID: i64 = 100;

// Player.
pub const INITIAL_LIVES: i32 = 3;
pub const INVINCIBILITY_SECONDS: f64 = 3.0;
pub const PLAYER_BLINK_HZ: f64 = 10.0;
pub const RESPAWN_TIMEOUT_SECONDS: f64 = 3.0;
pub const MAX_USERNAME_LENGTH: usize = 16;

// Ship physics.
pub const SHIP_THRUST_POWER: f64 = 40.0; // units/second^2
pub const SHIP_ROTATION_SPEED: f64 = 5.0; // radians/second
pub const SHIP_MAX_SPEED: f64 = 25.0;
pub const SHIP_DRAG: f64 = 0.5; // velocity multiplier per second when coasting
pub const SHIP_SIZE: f64 = 2.0;
pub const SHIP_FIRE_RATE: f64 = 0.15; // minimum seconds between shots

// Projectiles. The collision radius is a fixed constant; projectiles do not
// vary in size.
pub const PROJECTILE_SPEED: f64 = 50.0;
pub const PROJECTILE_LIFETIME: f64 = 2.0;
pub const PROJECTILE_RADIUS: f64 = 0.5;

// Asteroids.
pub const SPAWN_PROTECTION_SECONDS: f64 = 3.0;
pub const ASTEROID_BLINK_HZ: f64 = 5.0;
pub const INITIAL_ASTEROID_TARGET: i32 = 250;

// Broad-phase grid cell size. Must be >= the largest collision distance,
// which is two large asteroids: 5.0 + 5.0.
pub const COLLISION_GRID_CELL_SIZE: f64 = 10.0;

// Shutdown and inactivity.
pub const SHUTDOWN_DISPLAY_SECONDS: f64 = 10.0;
pub const INACTIVITY_WARN_SECONDS: f64 = 90.0;
pub const INACTIVITY_DISCONNECT_SECONDS: f64 = 120.0;

// Tick rates.
pub const SERVER_TICK_RATE: u32 = 60;
pub const SERVER_TICK_TIME: Duration = Duration::from_nanos(1_000_000_000 / SERVER_TICK_RATE as u64);
pub const CLIENT_TARGET_FPS: u32 = 60;
pub const CLIENT_TARGET_FRAME_TIME: Duration =
    Duration::from_nanos(1_000_000_000 / CLIENT_TARGET_FPS as u64);
