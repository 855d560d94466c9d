//! Game entities: the sum type, update/draw contexts and shared behavior.

mod asteroid;
mod particle;
mod projectile;
mod ship;
mod spawner;

pub use asteroid::{Asteroid, AsteroidSize};
pub use particle::{spawn_explosion, spawn_thrust, Particle};
pub use projectile::Projectile;
pub use ship::Ship;
pub use spawner::AsteroidSpawner;

use crate::draw::Canvas;
use crate::geometry::{Bounds, Camera};
use crate::input::Input;
use std::fmt;

/// Everything an entity needs during its update step.
pub struct UpdateContext<'a> {
    /// Frame delta time in seconds.
    pub dt: f64,
    /// Input for this entity; only ships read it.
    pub input: Input,
    /// World bounds for wrapping.
    pub world: Bounds,
    /// Sink for newly spawned entities, flushed into the world after the
    /// update pass.
    pub spawned: &'a mut Vec<GameObject>,
    /// Weighted asteroid population, maintained incrementally by the world.
    pub asteroid_weight: i32,
}

/// Drawing resources for entities. All shape drawing goes through the
/// canvas; the camera transform decides where (and how many times, for
/// objects straddling the world seam) each entity appears.
pub struct DrawContext<'a> {
    pub canvas: &'a mut Canvas,
    pub camera: Camera,
    pub view: Bounds,
    pub world: Bounds,
}

/// Failure raised by an entity update. The built-in entities never fail;
/// the variant exists so future entities can surface errors without
/// changing the update contract.
#[derive(Debug, Clone)]
pub struct UpdateError {
    pub message: String,
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity update failed: {}", self.message)
    }
}

impl std::error::Error for UpdateError {}

/// A game entity. Updates may request their own removal; drawing composes
/// the entity onto the client's canvas.
#[derive(Debug, Clone)]
pub enum GameObject {
    Ship(Ship),
    Projectile(Projectile),
    Asteroid(Asteroid),
    Particle(Particle),
    Spawner(AsteroidSpawner),
}

impl GameObject {
    /// Advances the entity one tick. Returns `Ok(true)` if the entity
    /// should be removed from the world.
    pub fn update(&mut self, ctx: &mut UpdateContext) -> Result<bool, UpdateError> {
        match self {
            GameObject::Ship(ship) => ship.update(ctx),
            GameObject::Projectile(projectile) => projectile.update(ctx),
            GameObject::Asteroid(asteroid) => asteroid.update(ctx),
            GameObject::Particle(particle) => particle.update(ctx),
            GameObject::Spawner(spawner) => spawner.update(ctx),
        }
    }

    pub fn draw(&self, ctx: &mut DrawContext) {
        match self {
            GameObject::Ship(ship) => ship.draw(ctx),
            GameObject::Projectile(projectile) => projectile.draw(ctx),
            GameObject::Asteroid(asteroid) => asteroid.draw(ctx),
            GameObject::Particle(particle) => particle.draw(ctx),
            GameObject::Spawner(_) => {}
        }
    }

    pub fn as_ship(&self) -> Option<&Ship> {
        match self {
            GameObject::Ship(ship) => Some(ship),
            _ => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Builds an update context over a spawn sink with the standard world
    /// bounds, for entity unit tests.
    pub fn ctx<'a>(
        dt: f64,
        input: Input,
        spawned: &'a mut Vec<GameObject>,
        asteroid_weight: i32,
    ) -> UpdateContext<'a> {
        UpdateContext {
            dt,
            input,
            world: Bounds::new(crate::tuning::WORLD_WIDTH, crate::tuning::WORLD_HEIGHT),
            spawned,
            asteroid_weight,
        }
    }
}
