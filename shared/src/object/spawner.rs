//! Keeps the asteroid field populated.

use super::{Asteroid, AsteroidSize, GameObject, UpdateContext, UpdateError};
use crate::tuning;

/// Replenishment threshold: only refill once the weighted population has
/// dropped this far below target, and then in Large units, so destruction
/// of a single rock does not trigger an immediate respawn flood.
const BATCH_THRESHOLD: i32 = 12;

/// Invisible entity that spawns Large asteroids at random positions
/// whenever the weighted population falls far enough below its target.
#[derive(Debug, Clone, Copy)]
pub struct AsteroidSpawner {
    target: i32,
}

impl AsteroidSpawner {
    pub fn new(target: i32) -> Self {
        Self {
            target: target.max(0),
        }
    }

    pub fn update(&mut self, ctx: &mut UpdateContext) -> Result<bool, UpdateError> {
        if self.target == 0 {
            return Ok(false);
        }

        let mut count = ctx.asteroid_weight;
        if count >= self.target {
            return Ok(false);
        }

        while self.target - count >= BATCH_THRESHOLD {
            ctx.spawned.push(GameObject::Asteroid(Asteroid::new_random(
                ctx.world,
                AsteroidSize::Large,
                tuning::SPAWN_PROTECTION_SECONDS,
            )));
            count += AsteroidSize::Large.weight();
        }

        Ok(false)
    }
}
