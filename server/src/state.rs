//! Shared world state: the entity container, spawn queue, weighted asteroid
//! counter and the per-tick snapshot type.

use shared::grid::SpatialGrid;
use shared::object::{GameObject, Ship, UpdateContext, UpdateError};
use shared::{tuning, Bounds, Input};
use std::sync::Arc;

/// One leaderboard row.
#[derive(Debug, Clone)]
pub struct TopScoreEntry {
    pub username: Arc<str>,
    pub score: i64,
    /// Deterministic tie-break when scores are equal.
    pub(crate) client_id: i32,
}

/// An entity update that raised; the server logs it and, when a client's
/// ship was responsible, unregisters that client.
#[derive(Debug)]
pub struct UpdateFailure {
    pub owner_id: Option<i32>,
    pub error: UpdateError,
}

/// The world owned by the server task. All mutation happens inside the
/// tick; clients only ever see published [`WorldSnapshot`]s.
pub struct WorldState {
    pub objects: Vec<GameObject>,
    /// Entities queued during the update and collision passes, flushed into
    /// the world by the next update pass.
    pub(crate) spawned: Vec<GameObject>,
    pub world: Bounds,
    /// Delta time of the last tick, in seconds.
    pub dt: f64,
    /// Weighted asteroid population (Large 4, Medium 2, Small 1),
    /// maintained incrementally as entities enter and leave the world.
    pub asteroid_weight: i32,

    // Collision scratch, reused every tick.
    pub(crate) projectiles: Vec<usize>,
    pub(crate) asteroids: Vec<usize>,
    pub(crate) ships: Vec<usize>,
    pub(crate) asteroid_grid: SpatialGrid,
    pub(crate) projectile_grid: SpatialGrid,
}

/// Weighted population contribution of an entity; zero for everything but
/// asteroids. Removing a destroyed Large and flushing its two Medium
/// fragments leaves the total unchanged.
pub(crate) fn weight_of(obj: &GameObject) -> i32 {
    match obj {
        GameObject::Asteroid(a) => a.size.weight(),
        _ => 0,
    }
}

impl WorldState {
    pub fn new(world: Bounds) -> Self {
        let cell = tuning::COLLISION_GRID_CELL_SIZE;
        Self {
            objects: Vec::new(),
            spawned: Vec::new(),
            world,
            dt: 0.0,
            asteroid_weight: 0,
            projectiles: Vec::new(),
            asteroids: Vec::new(),
            ships: Vec::new(),
            asteroid_grid: SpatialGrid::new(world.width, world.height, cell),
            projectile_grid: SpatialGrid::new(world.width, world.height, cell),
        }
    }

    /// Adds an entity directly (registration-time spawns).
    pub fn add_object(&mut self, obj: GameObject) {
        self.asteroid_weight += weight_of(&obj);
        self.objects.push(obj);
    }

    /// Moves all queued entities into the world, updating the weight
    /// counter.
    pub fn flush_spawned(&mut self) {
        for obj in self.spawned.drain(..) {
            self.asteroid_weight += weight_of(&obj);
            self.objects.push(obj);
        }
    }

    /// Removes the ship owned by `client_id`, if present.
    pub fn remove_ship(&mut self, client_id: i32) {
        self.objects
            .retain(|obj| !matches!(obj.as_ship(), Some(ship) if ship.owner_id == client_id));
    }

    pub fn ship_of(&self, client_id: i32) -> Option<&Ship> {
        self.objects
            .iter()
            .filter_map(GameObject::as_ship)
            .find(|ship| ship.owner_id == client_id)
    }

    /// Runs one entity update pass: ships first with their client's latest
    /// input, then everything else with an empty input. Removed entities
    /// are compacted out in place (backing storage is reused) and their
    /// weight contribution is subtracted. Spawned entities are flushed in
    /// at the end.
    pub fn update_entities(
        &mut self,
        dt: f64,
        mut input_for: impl FnMut(i32) -> Option<Input>,
    ) -> Vec<UpdateFailure> {
        self.dt = dt;
        let mut failures = Vec::new();

        let Self {
            objects,
            spawned,
            world,
            asteroid_weight,
            ..
        } = self;

        for obj in objects.iter_mut() {
            let owner_id = match obj.as_ship() {
                Some(ship) => ship.owner_id,
                None => continue,
            };
            let mut ctx = UpdateContext {
                dt,
                input: input_for(owner_id).unwrap_or_default(),
                world: *world,
                spawned: &mut *spawned,
                asteroid_weight: *asteroid_weight,
            };
            if let Err(error) = obj.update(&mut ctx) {
                failures.push(UpdateFailure {
                    owner_id: Some(owner_id),
                    error,
                });
            }
        }

        objects.retain_mut(|obj| {
            if matches!(obj, GameObject::Ship(_)) {
                return true;
            }
            let mut ctx = UpdateContext {
                dt,
                input: Input::default(),
                world: *world,
                spawned: &mut *spawned,
                asteroid_weight: *asteroid_weight,
            };
            match obj.update(&mut ctx) {
                Ok(true) => {
                    *asteroid_weight -= weight_of(obj);
                    false
                }
                Ok(false) => true,
                Err(error) => {
                    failures.push(UpdateFailure {
                        owner_id: None,
                        error,
                    });
                    true
                }
            }
        });

        self.flush_spawned();
        failures
    }
}

/// Immutable view of the world published once per tick. Clients hold the
/// snapshot for the duration of one render frame.
#[derive(Debug, Default, Clone)]
pub struct WorldSnapshot {
    pub objects: Vec<GameObject>,
    /// The ships from `objects`, for HUD overlays (names, minimap).
    pub ships: Vec<Ship>,
    /// Number of connected clients.
    pub players: usize,
    pub world: Bounds,
    /// Delta time of the tick that produced this snapshot.
    pub dt: f64,
    pub top_scores: Vec<TopScoreEntry>,
}

impl WorldSnapshot {
    pub fn ship_of(&self, client_id: i32) -> Option<&Ship> {
        self.ships.iter().find(|ship| ship.owner_id == client_id)
    }
}
