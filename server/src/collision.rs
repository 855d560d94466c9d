//! The per-tick collision phase: broad-phase via spatial hash grids,
//! narrow-phase circle tests, elastic asteroid bounces and hit attribution.

use crate::server::{ClientEntry, ClientEvent};
use crate::state::WorldState;
use shared::geometry::{circles_overlap, distance, point_in_circle};
use shared::object::{spawn_explosion, Asteroid, GameObject};
use shared::tuning;
use std::collections::HashMap;

/// Runs the full collision phase over the world, attributing scores and
/// deaths to the given client registry.
pub(crate) fn check_collisions(world: &mut WorldState, clients: &mut HashMap<i32, ClientEntry>) {
    classify(world);
    populate_grids(world);

    projectile_asteroid_collisions(world, clients);
    projectile_projectile_collisions(world);
    asteroid_asteroid_collisions(world);
    ship_collisions(world, clients);
}

/// Scans the entity list once, filling the reusable index scratch vectors.
fn classify(world: &mut WorldState) {
    world.projectiles.clear();
    world.asteroids.clear();
    world.ships.clear();

    for (i, obj) in world.objects.iter().enumerate() {
        match obj {
            GameObject::Projectile(_) => world.projectiles.push(i),
            GameObject::Asteroid(_) => world.asteroids.push(i),
            GameObject::Ship(_) => world.ships.push(i),
            _ => {}
        }
    }
}

/// Rebuilds both spatial grids from the classified entities. The grids
/// store indices into the projectile/asteroid scratch lists.
fn populate_grids(world: &mut WorldState) {
    let WorldState {
        objects,
        projectiles,
        asteroids,
        asteroid_grid,
        projectile_grid,
        ..
    } = world;

    asteroid_grid.clear();
    for (li, &i) in asteroids.iter().enumerate() {
        if let GameObject::Asteroid(a) = &objects[i] {
            asteroid_grid.insert(a.x, a.y, li);
        }
    }

    projectile_grid.clear();
    for (li, &i) in projectiles.iter().enumerate() {
        if let GameObject::Projectile(p) = &objects[i] {
            projectile_grid.insert(p.x, p.y, li);
        }
    }
}

fn projectile_asteroid_collisions(world: &mut WorldState, clients: &mut HashMap<i32, ClientEntry>) {
    let WorldState {
        objects,
        projectiles,
        asteroids,
        asteroid_grid,
        ..
    } = world;

    for &pi in projectiles.iter() {
        let (px, py, owner_id) = match &objects[pi] {
            GameObject::Projectile(p) if !p.destroyed => (p.x, p.y, p.owner_id),
            _ => continue,
        };

        let mut hit = None;
        asteroid_grid.query_around(px, py, |li| {
            let a = match &objects[asteroids[li]] {
                GameObject::Asteroid(a) => a,
                _ => return false,
            };
            if a.destroyed || a.is_protected() {
                return false;
            }
            if point_in_circle(px, py, a.x, a.y, a.radius) {
                hit = Some(li);
                return true;
            }
            false
        });

        let Some(li) = hit else { continue };

        let score = match &mut objects[asteroids[li]] {
            GameObject::Asteroid(a) => {
                a.mark_destroyed();
                a.size.score()
            }
            _ => continue,
        };
        if let GameObject::Projectile(p) = &mut objects[pi] {
            p.destroyed = true;
        }

        // Award the kill to the projectile's owner; the event is advisory
        // and dropped when the client's channel is full.
        if let Some(entry) = clients.get_mut(&owner_id) {
            entry.score += score;
            let _ = entry.events.try_send(ClientEvent::ScoreAdd(score));
        }
    }
}

fn projectile_projectile_collisions(world: &mut WorldState) {
    let WorldState {
        objects,
        projectiles,
        projectile_grid,
        ..
    } = world;

    for (li, &pi) in projectiles.iter().enumerate() {
        let (px, py) = match &objects[pi] {
            GameObject::Projectile(p) if !p.destroyed => (p.x, p.y),
            _ => continue,
        };

        let mut hit = None;
        projectile_grid.query_around(px, py, |lj| {
            // Skip self and pairs already handled from the other side.
            if lj <= li {
                return false;
            }
            let other = match &objects[projectiles[lj]] {
                GameObject::Projectile(p) if !p.destroyed => p,
                _ => return false,
            };
            if circles_overlap(
                px,
                py,
                tuning::PROJECTILE_RADIUS,
                other.x,
                other.y,
                tuning::PROJECTILE_RADIUS,
            ) {
                hit = Some(lj);
                return true;
            }
            false
        });

        if let Some(lj) = hit {
            if let GameObject::Projectile(p) = &mut objects[pi] {
                p.destroyed = true;
            }
            if let GameObject::Projectile(p) = &mut objects[projectiles[lj]] {
                p.destroyed = true;
            }
        }
    }
}

fn asteroid_asteroid_collisions(world: &mut WorldState) {
    let WorldState {
        objects,
        asteroids,
        asteroid_grid,
        ..
    } = world;

    let mut candidates = Vec::new();

    for (li, &ai) in asteroids.iter().enumerate() {
        let (ax, ay, ar) = match &objects[ai] {
            GameObject::Asteroid(a) if !a.destroyed => (a.x, a.y, a.radius),
            _ => continue,
        };

        candidates.clear();
        asteroid_grid.query_around(ax, ay, |lj| {
            if lj <= li {
                return false;
            }
            let other = match &objects[asteroids[lj]] {
                GameObject::Asteroid(a) if !a.destroyed => a,
                _ => return false,
            };
            let dist = distance(ax, ay, other.x, other.y);
            if dist < ar + other.radius && dist > 0.0 {
                candidates.push(asteroids[lj]);
            }
            false
        });

        for &bi in &candidates {
            if let Some((a1, a2)) = asteroid_pair_mut(objects, ai, bi) {
                // Earlier bounces this pass may have separated the pair.
                let dist = distance(a1.x, a1.y, a2.x, a2.y);
                if dist < a1.radius + a2.radius && dist > 0.0 {
                    elastic_bounce(a1, a2, dist);
                }
            }
        }
    }
}

/// Borrows two distinct entities as asteroids.
fn asteroid_pair_mut(
    objects: &mut [GameObject],
    i: usize,
    j: usize,
) -> Option<(&mut Asteroid, &mut Asteroid)> {
    if i == j {
        return None;
    }
    let (lo, hi) = if i < j { (i, j) } else { (j, i) };
    let (left, right) = objects.split_at_mut(hi);
    let first = match &mut left[lo] {
        GameObject::Asteroid(a) => a,
        _ => return None,
    };
    let second = match &mut right[0] {
        GameObject::Asteroid(a) => a,
        _ => return None,
    };
    if i < j {
        Some((first, second))
    } else {
        Some((second, first))
    }
}

/// Elastic collision between two asteroids with radius-squared masses
/// (area surrogate). Applies the impulse along the collision normal and
/// separates the overlap proportionally to the opposite mass.
pub fn elastic_bounce(a1: &mut Asteroid, a2: &mut Asteroid, dist: f64) {
    let nx = (a2.x - a1.x) / dist;
    let ny = (a2.y - a1.y) / dist;

    let dvx = a1.vx - a2.vx;
    let dvy = a1.vy - a2.vy;
    let dvn = dvx * nx + dvy * ny;

    // Already separating.
    if dvn < 0.0 {
        return;
    }

    let m1 = a1.radius * a1.radius;
    let m2 = a2.radius * a2.radius;
    let total_mass = m1 + m2;

    let impulse = 2.0 * dvn / total_mass;
    a1.vx -= impulse * m2 * nx;
    a1.vy -= impulse * m2 * ny;
    a2.vx += impulse * m1 * nx;
    a2.vy += impulse * m1 * ny;

    let overlap = (a1.radius + a2.radius) - dist;
    if overlap > 0.0 {
        let sep1 = overlap * m2 / total_mass;
        let sep2 = overlap * m1 / total_mass;
        a1.x -= nx * sep1;
        a1.y -= ny * sep1;
        a2.x += nx * sep2;
        a2.y += ny * sep2;
    }
}

fn ship_collisions(world: &mut WorldState, clients: &mut HashMap<i32, ClientEntry>) {
    let WorldState {
        objects,
        projectiles,
        asteroids,
        ships,
        spawned,
        ..
    } = world;

    let mut dead_ships = Vec::new();

    for (&client_id, entry) in clients.iter_mut() {
        if !entry.ship_alive || entry.invincible_time > 0.0 {
            continue;
        }

        let Some(&ship_idx) = ships.iter().find(|&&i| {
            matches!(objects[i].as_ship(), Some(ship) if ship.owner_id == client_id)
        }) else {
            continue;
        };
        let (sx, sy, sr) = match objects[ship_idx].as_ship() {
            Some(ship) => (ship.x, ship.y, ship.radius),
            None => continue,
        };

        let mut hit = false;

        // Projectile hits; a ship never collides with its own shots.
        for &pi in projectiles.iter() {
            let strike = match &objects[pi] {
                GameObject::Projectile(p) if !p.destroyed && p.owner_id != client_id => {
                    point_in_circle(p.x, p.y, sx, sy, sr)
                }
                _ => false,
            };
            if strike {
                if let GameObject::Projectile(p) = &mut objects[pi] {
                    p.destroyed = true;
                }
                hit = true;
                break;
            }
        }

        if !hit {
            for &ai in asteroids.iter() {
                if let GameObject::Asteroid(a) = &objects[ai] {
                    if !a.destroyed
                        && !a.is_protected()
                        && circles_overlap(sx, sy, sr, a.x, a.y, a.radius)
                    {
                        hit = true;
                        break;
                    }
                }
            }
        }

        if hit {
            spawn_explosion(sx, sy, 20, 25.0, 1.0, spawned);
            dead_ships.push(ship_idx);
            entry.ship_alive = false;
            let _ = entry.events.try_send(ClientEvent::PlayerDied);
        }
    }

    // Compact killed ships out, preserving entity order and reusing the
    // backing storage.
    if !dead_ships.is_empty() {
        let mut write = 0;
        for read in 0..objects.len() {
            if !dead_ships.contains(&read) {
                objects.swap(write, read);
                write += 1;
            }
        }
        objects.truncate(write);
    }
}
