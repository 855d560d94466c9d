//! The player-controlled spaceship.

use super::particle::spawn_thrust;
use super::projectile::Projectile;
use super::{DrawContext, GameObject, UpdateContext, UpdateError};
use crate::geometry::{should_render_blink, world_to_screen, Point};
use crate::tuning;
use std::f64::consts::PI;
use std::sync::Arc;

/// A spaceship with momentum physics: thrust accelerates along the heading,
/// coasting decays velocity exponentially, speed is capped.
#[derive(Debug, Clone)]
pub struct Ship {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Heading in radians; 0 points right, positive rotates clockwise in
    /// screen space (y grows downward).
    pub angle: f64,

    pub thrust_power: f64,
    pub rotation_speed: f64,
    pub max_speed: f64,
    /// Velocity multiplier per second while coasting (1.0 = no drag).
    pub drag: f64,
    pub radius: f64,

    pub fire_rate: f64,
    fire_cooldown: f64,

    /// Client that owns this ship.
    pub owner_id: i32,
    pub username: Arc<str>,
}

impl Ship {
    pub fn new(x: f64, y: f64, owner_id: i32, username: Arc<str>) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            angle: -PI / 2.0, // start pointing up
            thrust_power: tuning::SHIP_THRUST_POWER,
            rotation_speed: tuning::SHIP_ROTATION_SPEED,
            max_speed: tuning::SHIP_MAX_SPEED,
            drag: tuning::SHIP_DRAG,
            radius: tuning::SHIP_SIZE,
            fire_rate: tuning::SHIP_FIRE_RATE,
            fire_cooldown: 0.0,
            owner_id,
            username,
        }
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Handles rotation, thrust, momentum physics and shooting.
    pub fn update(&mut self, ctx: &mut UpdateContext) -> Result<bool, UpdateError> {
        let dt = ctx.dt;

        if ctx.input.left {
            self.angle -= self.rotation_speed * dt;
        }
        if ctx.input.right {
            self.angle += self.rotation_speed * dt;
        }

        // Normalize the heading to [-pi, pi].
        while self.angle > PI {
            self.angle -= 2.0 * PI;
        }
        while self.angle < -PI {
            self.angle += 2.0 * PI;
        }

        if ctx.input.up {
            self.vx += self.angle.cos() * self.thrust_power * dt;
            self.vy += self.angle.sin() * self.thrust_power * dt;

            // Exhaust particles from the back of the ship.
            let back_x =
                self.x - self.angle.cos() * self.radius * tuning::TERMINAL_ASPECT * 0.5;
            let back_y = self.y - self.angle.sin() * self.radius * 0.5;
            spawn_thrust(back_x, back_y, self.angle, ctx.spawned);
        } else {
            let drag_factor = self.drag.powf(dt);
            self.vx *= drag_factor;
            self.vy *= drag_factor;
        }

        let speed = (self.vx * self.vx + self.vy * self.vy).sqrt();
        if speed > self.max_speed {
            let scale = self.max_speed / speed;
            self.vx *= scale;
            self.vy *= scale;
        }

        self.x += self.vx * dt;
        self.y += self.vy * dt;
        ctx.world.wrap_position(&mut self.x, &mut self.y);

        self.fire_cooldown -= dt;
        if ctx.input.space && self.fire_cooldown <= 0.0 {
            self.fire_cooldown = self.fire_rate;

            let nose_x = self.x + self.angle.cos() * self.radius * tuning::TERMINAL_ASPECT;
            let nose_y = self.y + self.angle.sin() * self.radius;
            ctx.spawned.push(GameObject::Projectile(Projectile::new(
                nose_x,
                nose_y,
                self.angle,
                self.vx,
                self.vy,
                self.owner_id,
            )));
        }

        Ok(false)
    }

    /// Renders the ship as a filled triangle pointing along its heading,
    /// once per visible wrap copy.
    pub fn draw(&self, ctx: &mut DrawContext) {
        let nose_angle = self.angle;
        let left_angle = self.angle + 2.5; // ~143 degrees off the nose
        let right_angle = self.angle - 2.5;
        let size = self.radius;

        for pos in world_to_screen(self.x, self.y, ctx.camera, ctx.view, ctx.world).iter() {
            let triangle = [
                Point {
                    x: pos.x + nose_angle.cos() * size * tuning::TERMINAL_ASPECT,
                    y: pos.y + nose_angle.sin() * size,
                },
                Point {
                    x: pos.x + left_angle.cos() * size * 0.7 * tuning::TERMINAL_ASPECT,
                    y: pos.y + left_angle.sin() * size * 0.7,
                },
                Point {
                    x: pos.x + right_angle.cos() * size * 0.7 * tuning::TERMINAL_ASPECT,
                    y: pos.y + right_angle.sin() * size * 0.7,
                },
            ];
            ctx.canvas.draw_polygon(&triangle, true);
        }
    }

    /// Whether a ship with the given remaining invincibility should render
    /// this frame (blinking while protected).
    pub fn visible_while_invincible(invincible_time: f64) -> bool {
        should_render_blink(invincible_time, tuning::PLAYER_BLINK_HZ)
    }
}
