//! Projectiles fired by ships.

use super::{DrawContext, UpdateContext, UpdateError};
use crate::geometry::world_to_screen;
use crate::tuning;

/// A bullet. Velocity is the shooter's velocity plus the projectile speed
/// along the firing direction at birth, constant afterwards.
#[derive(Debug, Clone)]
pub struct Projectile {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Seconds remaining before the projectile expires.
    pub lifetime: f64,
    /// Client whose ship fired this projectile; it never hits its owner.
    pub owner_id: i32,
    pub destroyed: bool,
}

impl Projectile {
    pub fn new(x: f64, y: f64, angle: f64, shooter_vx: f64, shooter_vy: f64, owner_id: i32) -> Self {
        Self {
            x,
            y,
            vx: shooter_vx + angle.cos() * tuning::PROJECTILE_SPEED,
            vy: shooter_vy + angle.sin() * tuning::PROJECTILE_SPEED,
            lifetime: tuning::PROJECTILE_LIFETIME,
            owner_id,
            destroyed: false,
        }
    }

    pub fn update(&mut self, ctx: &mut UpdateContext) -> Result<bool, UpdateError> {
        if self.destroyed {
            return Ok(true);
        }

        self.lifetime -= ctx.dt;
        if self.lifetime <= 0.0 {
            return Ok(true);
        }

        self.x += self.vx * ctx.dt;
        self.y += self.vy * ctx.dt;
        ctx.world.wrap_position(&mut self.x, &mut self.y);

        Ok(false)
    }

    pub fn draw(&self, ctx: &mut DrawContext) {
        if self.destroyed {
            return;
        }
        for pos in world_to_screen(self.x, self.y, ctx.camera, ctx.view, ctx.world).iter() {
            ctx.canvas.set_float(pos.x, pos.y);
        }
    }
}
