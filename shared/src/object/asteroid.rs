//! Destructible space rocks with three size tiers.

use super::particle::spawn_explosion;
use super::{DrawContext, GameObject, UpdateContext, UpdateError};
use crate::geometry::{should_render_blink, world_to_screen, Bounds, Point};
use crate::tuning;
use rand::Rng;
use std::f64::consts::PI;

/// Size category. Destroying a Large spawns two Mediums, a Medium two
/// Smalls, which is why the weighted population counts 4/2/1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AsteroidSize {
    Small,
    Medium,
    Large,
}

impl AsteroidSize {
    pub fn radius(self) -> f64 {
        match self {
            AsteroidSize::Small => 1.5,
            AsteroidSize::Medium => 3.0,
            AsteroidSize::Large => 5.0,
        }
    }

    pub fn speed(self) -> f64 {
        match self {
            AsteroidSize::Small => 15.0,
            AsteroidSize::Medium => 10.0,
            AsteroidSize::Large => 6.0,
        }
    }

    pub fn score(self) -> i64 {
        match self {
            AsteroidSize::Small => tuning::SCORE_SMALL_ASTEROID,
            AsteroidSize::Medium => tuning::SCORE_MEDIUM_ASTEROID,
            AsteroidSize::Large => tuning::SCORE_LARGE_ASTEROID,
        }
    }

    /// Weighted population contribution: one Large eventually fragments
    /// into four Smalls.
    pub fn weight(self) -> i32 {
        match self {
            AsteroidSize::Small => 1,
            AsteroidSize::Medium => 2,
            AsteroidSize::Large => 4,
        }
    }

    /// Tier as a number (Small = 1), used for explosion sizing.
    pub fn tier(self) -> usize {
        match self {
            AsteroidSize::Small => 1,
            AsteroidSize::Medium => 2,
            AsteroidSize::Large => 3,
        }
    }

    pub fn smaller(self) -> Option<AsteroidSize> {
        match self {
            AsteroidSize::Large => Some(AsteroidSize::Medium),
            AsteroidSize::Medium => Some(AsteroidSize::Small),
            AsteroidSize::Small => None,
        }
    }
}

/// Maximum number of outline vertices; actual shapes use 8-12.
const MAX_VERTICES: usize = 12;

#[derive(Debug, Clone)]
pub struct Asteroid {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub angle: f64,
    pub rotation_speed: f64,
    pub size: AsteroidSize,
    pub radius: f64,
    /// Radial distance per vertex; the irregular outline descriptor.
    vertices: [f64; MAX_VERTICES],
    num_vertices: usize,
    pub destroyed: bool,
    /// While positive, the asteroid ignores damaging collisions and blinks.
    pub spawn_protection: f64,
}

impl Asteroid {
    /// Creates an asteroid moving along `heading` (random when `None`),
    /// with an irregular 8-12 vertex outline.
    pub fn new(x: f64, y: f64, size: AsteroidSize, heading: Option<f64>, protection: f64) -> Self {
        let mut rng = rand::thread_rng();
        let radius = size.radius();
        let speed = size.speed();
        let heading = heading.unwrap_or_else(|| rng.gen_range(0.0..2.0 * PI));

        let num_vertices = rng.gen_range(8..=MAX_VERTICES);
        let mut vertices = [0.0; MAX_VERTICES];
        for v in vertices.iter_mut().take(num_vertices) {
            // Vary radius by +-30% for the irregular shape.
            *v = radius * rng.gen_range(0.7..1.3);
        }

        Self {
            x,
            y,
            vx: heading.cos() * speed,
            vy: heading.sin() * speed,
            angle: rng.gen_range(0.0..2.0 * PI),
            rotation_speed: rng.gen_range(-1.0..1.0),
            size,
            radius,
            vertices,
            num_vertices,
            destroyed: false,
            spawn_protection: protection,
        }
    }

    /// Creates an asteroid at a random world position.
    pub fn new_random(world: Bounds, size: AsteroidSize, protection: f64) -> Self {
        let mut rng = rand::thread_rng();
        let x = rng.gen_range(0.0..world.width);
        let y = rng.gen_range(0.0..world.height);
        Self::new(x, y, size, None, protection)
    }

    pub fn is_protected(&self) -> bool {
        self.spawn_protection > 0.0
    }

    pub fn mark_destroyed(&mut self) {
        self.destroyed = true;
    }

    /// Moves and rotates the asteroid; once destroyed, bursts into
    /// explosion particles and (above Small) two fragments of the next
    /// smaller tier, then requests removal.
    pub fn update(&mut self, ctx: &mut UpdateContext) -> Result<bool, UpdateError> {
        if self.destroyed {
            let particle_count = self.size.tier() * 4;
            spawn_explosion(self.x, self.y, particle_count, 20.0, 0.5, ctx.spawned);

            if let Some(child_size) = self.size.smaller() {
                for _ in 0..2 {
                    ctx.spawned.push(GameObject::Asteroid(Asteroid::new(
                        self.x, self.y, child_size, None, 0.0,
                    )));
                }
            }
            return Ok(true);
        }

        let dt = ctx.dt;

        if self.spawn_protection > 0.0 {
            self.spawn_protection -= dt;
        }

        self.angle += self.rotation_speed * dt;
        self.x += self.vx * dt;
        self.y += self.vy * dt;
        ctx.world.wrap_position(&mut self.x, &mut self.y);

        Ok(false)
    }

    /// Renders the asteroid outline, blinking at 5 Hz while protected.
    pub fn draw(&self, ctx: &mut DrawContext) {
        if self.destroyed {
            return;
        }
        if !should_render_blink(self.spawn_protection, tuning::ASTEROID_BLINK_HZ) {
            return;
        }

        let mut points = [Point::default(); MAX_VERTICES];
        for pos in world_to_screen(self.x, self.y, ctx.camera, ctx.view, ctx.world).iter() {
            for (i, &dist) in self.vertices[..self.num_vertices].iter().enumerate() {
                let vert_angle = self.angle + i as f64 * 2.0 * PI / self.num_vertices as f64;
                points[i] = Point {
                    x: pos.x + vert_angle.cos() * dist * tuning::TERMINAL_ASPECT,
                    y: pos.y + vert_angle.sin() * dist,
                };
            }
            ctx.canvas.draw_polygon(&points[..self.num_vertices], false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::test_support::ctx;
    use crate::Input;

    #[test]
    fn test_new_asteroid_has_irregular_outline() {
        let a = Asteroid::new(10.0, 10.0, AsteroidSize::Large, Some(0.0), 0.0);
        assert!((8..=12).contains(&a.num_vertices));
        for &v in &a.vertices[..a.num_vertices] {
            assert!(v >= a.radius * 0.7 && v <= a.radius * 1.3);
        }
    }

    #[test]
    fn test_heading_sets_velocity() {
        let a = Asteroid::new(0.0, 0.0, AsteroidSize::Medium, Some(0.0), 0.0);
        assert!((a.vx - AsteroidSize::Medium.speed()).abs() < 1e-9);
        assert!(a.vy.abs() < 1e-9);
    }

    #[test]
    fn test_spawn_protection_decays() {
        let mut a = Asteroid::new(10.0, 10.0, AsteroidSize::Large, Some(0.0), 0.5);
        assert!(a.is_protected());

        let mut spawned = Vec::new();
        for _ in 0..60 {
            a.update(&mut ctx(1.0 / 60.0, Input::default(), &mut spawned, 0))
                .unwrap();
        }
        assert!(!a.is_protected());
    }

    #[test]
    fn test_destroyed_large_splits_into_two_mediums() {
        let mut a = Asteroid::new(30.0, 10.0, AsteroidSize::Large, Some(0.0), 0.0);
        a.mark_destroyed();

        let mut spawned = Vec::new();
        let remove = a
            .update(&mut ctx(1.0 / 60.0, Input::default(), &mut spawned, 0))
            .unwrap();
        assert!(remove);

        let children: Vec<&Asteroid> = spawned
            .iter()
            .filter_map(|obj| match obj {
                GameObject::Asteroid(child) => Some(child),
                _ => None,
            })
            .collect();
        assert_eq!(children.len(), 2);
        for child in &children {
            assert_eq!(child.size, AsteroidSize::Medium);
            assert!((child.x - 30.0).abs() < 1e-9);
            assert!((child.y - 10.0).abs() < 1e-9);
        }

        // 4 * tier explosion particles for a Large.
        let particles = spawned
            .iter()
            .filter(|obj| matches!(obj, GameObject::Particle(_)))
            .count();
        assert_eq!(particles, 12);
    }

    #[test]
    fn test_destroyed_small_leaves_no_fragments() {
        let mut a = Asteroid::new(0.0, 0.0, AsteroidSize::Small, Some(0.0), 0.0);
        a.mark_destroyed();

        let mut spawned = Vec::new();
        a.update(&mut ctx(1.0 / 60.0, Input::default(), &mut spawned, 0))
            .unwrap();

        assert!(spawned
            .iter()
            .all(|obj| matches!(obj, GameObject::Particle(_))));
    }

    #[test]
    fn test_split_preserves_weighted_population() {
        let parent = AsteroidSize::Large;
        let child = parent.smaller().unwrap();
        assert_eq!(parent.weight(), 2 * child.weight());
        assert_eq!(child.weight(), 2 * child.smaller().unwrap().weight());
    }

    #[test]
    fn test_position_wraps() {
        let mut a = Asteroid::new(tuning::WORLD_WIDTH - 0.1, 5.0, AsteroidSize::Small, Some(0.0), 0.0);
        let mut spawned = Vec::new();
        a.update(&mut ctx(0.5, Input::default(), &mut spawned, 0))
            .unwrap();
        assert!(a.x >= 0.0 && a.x < tuning::WORLD_WIDTH);
    }
}
