//! Short-lived visual effect particles.

use super::{DrawContext, GameObject, UpdateContext, UpdateError};
use crate::geometry::world_to_screen;
use rand::Rng;
use std::f64::consts::PI;

/// A single effect pixel with velocity, drag and a fade-out. Particles are
/// plain values living inline in the world's entity storage; spawning and
/// removal never touch the heap.
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub lifetime: f64,
    /// Initial lifetime, kept for the fade calculation.
    pub max_lifetime: f64,
    /// Velocity decay factor (1.0 = no drag), normalized to 60 Hz.
    pub drag: f64,
}

impl Particle {
    pub fn new(x: f64, y: f64, vx: f64, vy: f64, lifetime: f64) -> Self {
        Self {
            x,
            y,
            vx,
            vy,
            lifetime,
            max_lifetime: lifetime,
            drag: 0.95,
        }
    }

    pub fn update(&mut self, ctx: &mut UpdateContext) -> Result<bool, UpdateError> {
        let dt = ctx.dt;

        self.lifetime -= dt;
        if self.lifetime <= 0.0 {
            return Ok(true);
        }

        // Drag tuned against a 60 Hz frame so behavior is frame-rate
        // independent.
        let drag_factor = self.drag.powf(dt * 60.0);
        self.vx *= drag_factor;
        self.vy *= drag_factor;

        self.x += self.vx * dt;
        self.y += self.vy * dt;

        // No wrapping; particles just fall off the world edge.

        Ok(false)
    }

    pub fn draw(&self, ctx: &mut DrawContext) {
        // Suppress the tail end of the fade.
        if self.max_lifetime > 0.0 && self.lifetime / self.max_lifetime < 0.25 {
            return;
        }

        for pos in world_to_screen(self.x, self.y, ctx.camera, ctx.view, ctx.world).iter() {
            ctx.canvas.set_float(pos.x, pos.y);
        }
    }
}

/// Spawns `count` particles in a circular burst at (x, y). Speed varies
/// 50%-150%, lifetime 50%-100% per particle.
pub fn spawn_explosion(
    x: f64,
    y: f64,
    count: usize,
    speed: f64,
    lifetime: f64,
    spawned: &mut Vec<GameObject>,
) {
    let mut rng = rand::thread_rng();

    for _ in 0..count {
        let angle = rng.gen_range(0.0..2.0 * PI);
        let spd = speed * rng.gen_range(0.5..1.5);
        let life = lifetime * rng.gen_range(0.5..1.0);

        spawned.push(GameObject::Particle(Particle::new(
            x,
            y,
            angle.cos() * spd,
            angle.sin() * spd,
            life,
        )));
    }
}

/// Spawns 1-2 exhaust particles behind a thrusting ship, spread around the
/// opposite of its heading.
pub fn spawn_thrust(x: f64, y: f64, angle: f64, spawned: &mut Vec<GameObject>) {
    let mut rng = rand::thread_rng();
    let count = rng.gen_range(1..=2);

    for _ in 0..count {
        let thrust_angle = angle + PI + rng.gen_range(-0.25..0.25);
        let speed = rng.gen_range(8.0..12.0);
        let lifetime = rng.gen_range(0.1..0.25);

        let mut particle = Particle::new(
            x,
            y,
            thrust_angle.cos() * speed,
            thrust_angle.sin() * speed,
            lifetime,
        );
        particle.drag = 0.85;
        spawned.push(GameObject::Particle(particle));
    }
}
