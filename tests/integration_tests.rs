//! Integration scenarios across the server, client and shared crates.
//!
//! The game loop is driven deterministically through `GameLoop::step`, so
//! these tests exercise the real tick pipeline (channel drains, entity
//! updates, collision phase, snapshot publication) without depending on
//! wall-clock timing.

use server::{ClientEvent, ClientHandle, GameLoop, Server, ServerConfig};
use shared::object::{Asteroid, AsteroidSize, GameObject, Projectile};
use shared::{tuning, Input};
use std::f64::consts::PI;
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;

const DT: f64 = 1.0 / 60.0;

/// A server with an empty asteroid field so scenarios control every rock.
fn empty_field_config() -> ServerConfig {
    ServerConfig {
        asteroid_target: 0,
        ..ServerConfig::default()
    }
}

/// Registers a client and spawns its ship at the given pose, at rest.
async fn spawn_ship_at(
    server: &Server,
    game: &mut GameLoop,
    username: &str,
    x: f64,
    y: f64,
    angle: f64,
) -> ClientHandle {
    let handle = server.register_client(username).await;
    game.step(DT);
    server.spawn_player(handle.id).await;
    game.step(DT);

    for obj in &mut game.world_mut().objects {
        if let GameObject::Ship(ship) = obj {
            if ship.owner_id == handle.id {
                ship.x = x;
                ship.y = y;
                ship.vx = 0.0;
                ship.vy = 0.0;
                ship.angle = angle;
            }
        }
    }
    handle
}

fn add_static_asteroid(game: &mut GameLoop, x: f64, y: f64, size: AsteroidSize) {
    let mut asteroid = Asteroid::new(x, y, size, Some(0.0), 0.0);
    asteroid.vx = 0.0;
    asteroid.vy = 0.0;
    asteroid.rotation_speed = 0.0;
    game.world_mut().add_object(GameObject::Asteroid(asteroid));
}

fn drain_events(handle: &mut ClientHandle) -> Vec<ClientEvent> {
    let mut events = Vec::new();
    while let Ok(event) = handle.events.try_recv() {
        events.push(event);
    }
    events
}

fn asteroid_count(game: &GameLoop, size: AsteroidSize) -> usize {
    game.world()
        .objects
        .iter()
        .filter(|obj| matches!(obj, GameObject::Asteroid(a) if a.size == size && !a.destroyed))
        .count()
}

#[tokio::test]
async fn test_solo_kill_chain() {
    let (server, mut game) = Server::new(empty_field_config());
    let mut handle = spawn_ship_at(&server, &mut game, "solo", 10.0, 10.0, 0.0).await;

    // One Large rock dead ahead, drifting slowly across the firing line.
    let mut target = Asteroid::new(30.0, 10.0, AsteroidSize::Large, Some(PI / 2.0), 0.0);
    target.rotation_speed = 0.0;
    game.world_mut().add_object(GameObject::Asteroid(target));
    assert_eq!(game.world().asteroid_weight, 4);

    // Fire once along +X, then hold fire and let the shot fly.
    server.send_input(
        handle.id,
        Input {
            space: true,
            ..Input::default()
        },
    );
    game.step(DT);
    server.send_input(handle.id, Input::default());
    for _ in 0..60 {
        game.step(DT);
    }

    // The Large is gone, two Mediums took its place near the impact point.
    assert_eq!(asteroid_count(&game, AsteroidSize::Large), 0);
    assert_eq!(asteroid_count(&game, AsteroidSize::Medium), 2);
    assert_eq!(game.world().asteroid_weight, 4);

    let events = drain_events(&mut handle);
    let scores: Vec<i64> = events
        .iter()
        .filter_map(|event| match event {
            ClientEvent::ScoreAdd(points) => Some(*points),
            _ => None,
        })
        .collect();
    assert_eq!(scores, vec![tuning::SCORE_LARGE_ASTEROID]);
    assert!(!events.contains(&ClientEvent::PlayerDied));
}

#[tokio::test]
async fn test_own_projectile_is_harmless() {
    let config = ServerConfig {
        invincibility_seconds: 0.0,
        ..empty_field_config()
    };
    let (server, mut game) = Server::new(config);
    let mut handle = spawn_ship_at(&server, &mut game, "gunner", 50.0, 50.0, 0.0).await;

    // A projectile owned by the same client sitting on the ship.
    let mut own_shot = Projectile::new(50.0, 50.0, 0.0, 0.0, 0.0, handle.id);
    own_shot.vx = 0.0;
    own_shot.vy = 0.0;
    game.world_mut().add_object(GameObject::Projectile(own_shot));

    game.step(DT);
    game.step(DT);

    assert!(server.client_ship(handle.id).is_some());
    assert!(!drain_events(&mut handle).contains(&ClientEvent::PlayerDied));

    // The same shot from another client kills. Offset enough that the two
    // projectiles do not destroy each other first, but still inside the
    // ship's radius.
    let mut enemy_shot = Projectile::new(51.5, 50.0, 0.0, 0.0, 0.0, handle.id + 1000);
    enemy_shot.vx = 0.0;
    enemy_shot.vy = 0.0;
    game.world_mut()
        .add_object(GameObject::Projectile(enemy_shot));

    game.step(DT);
    game.step(DT);

    assert!(server.client_ship(handle.id).is_none());
    assert!(drain_events(&mut handle).contains(&ClientEvent::PlayerDied));
}

#[tokio::test]
async fn test_cross_fire_scoring_same_tick() {
    let (server, mut game) = Server::new(empty_field_config());
    let mut handle1 = spawn_ship_at(&server, &mut game, "one", 10.0, 10.0, 0.0).await;
    let mut handle2 = spawn_ship_at(&server, &mut game, "two", 10.0, 100.0, 0.0).await;

    add_static_asteroid(&mut game, 200.0, 50.0, AsteroidSize::Medium);
    add_static_asteroid(&mut game, 200.0, 150.0, AsteroidSize::Medium);

    // One projectile per client, each sitting inside its own target.
    for (x, y, owner) in [(200.0, 50.0, handle1.id), (200.0, 150.0, handle2.id)] {
        let mut shot = Projectile::new(x, y, 0.0, 0.0, 0.0, owner);
        shot.vx = 0.0;
        shot.vy = 0.0;
        game.world_mut().add_object(GameObject::Projectile(shot));
    }

    game.step(DT);

    for handle in [&mut handle1, &mut handle2] {
        let events = drain_events(handle);
        let scores: Vec<i64> = events
            .iter()
            .filter_map(|event| match event {
                ClientEvent::ScoreAdd(points) => Some(*points),
                _ => None,
            })
            .collect();
        assert_eq!(scores, vec![tuning::SCORE_MEDIUM_ASTEROID]);
    }
}

#[tokio::test]
async fn test_spawn_invincibility_window() {
    let (server, mut game) = Server::new(empty_field_config());
    let mut handle = spawn_ship_at(&server, &mut game, "newborn", 50.0, 50.0, 0.0).await;

    // An asteroid parked on the spawn point.
    add_static_asteroid(&mut game, 50.0, 50.0, AsteroidSize::Large);

    // Two seconds in: still invincible, still alive.
    game.step(2.0);
    assert!(server.client_ship(handle.id).is_some());
    assert!(!drain_events(&mut handle).contains(&ClientEvent::PlayerDied));

    // Past the three-second window the same overlap kills.
    game.step(1.2);
    assert!(server.client_ship(handle.id).is_none());
    let events = drain_events(&mut handle);
    assert!(events.contains(&ClientEvent::PlayerDied));
}

#[tokio::test]
async fn test_protected_asteroid_ignores_projectiles() {
    let (server, mut game) = Server::new(empty_field_config());
    let handle = server.register_client("sniper").await;
    game.step(DT);

    let mut rock = Asteroid::new(100.0, 100.0, AsteroidSize::Large, Some(0.0), 10.0);
    rock.vx = 0.0;
    rock.vy = 0.0;
    game.world_mut().add_object(GameObject::Asteroid(rock));

    let mut shot = Projectile::new(100.0, 100.0, 0.0, 0.0, 0.0, handle.id);
    shot.vx = 0.0;
    shot.vy = 0.0;
    game.world_mut().add_object(GameObject::Projectile(shot));

    game.step(DT);

    assert_eq!(asteroid_count(&game, AsteroidSize::Large), 1);
}

#[tokio::test]
async fn test_disconnect_drains_before_stale_input() {
    let (server, mut game) = Server::new(empty_field_config());
    let handle = server.register_client("ghost").await;
    game.step(DT);
    server.spawn_player(handle.id).await;
    game.step(DT);

    // Input and unregistration race into the same tick; the registration
    // drain runs first, so the stale input lands on a missing handle.
    server.send_input(
        handle.id,
        Input {
            up: true,
            ..Input::default()
        },
    );
    server.unregister_client(handle.id).await;
    game.step(DT);

    assert_eq!(server.player_count(), 0);
    assert!(server.client_ship(handle.id).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_graceful_shutdown_times_out_with_lingering_clients() {
    let (server, mut game) = Server::new(empty_field_config());
    let mut handle1 = server.register_client("one").await;
    let mut handle2 = server.register_client("two").await;
    game.step(DT);
    assert_eq!(server.player_count(), 2);

    let started = tokio::time::Instant::now();
    server.shutdown(Duration::from_secs(2)).await;
    let waited = started.elapsed();

    // Returned at the deadline even though nobody disconnected.
    assert!(waited >= Duration::from_secs(2));
    assert!(waited < Duration::from_secs(3));

    // Each client received exactly one shutdown notice.
    for handle in [&mut handle1, &mut handle2] {
        assert_eq!(handle.events.try_recv(), Ok(ClientEvent::ServerShutdown));
        assert_eq!(handle.events.try_recv(), Err(TryRecvError::Empty));
    }
}

#[tokio::test]
async fn test_graceful_shutdown_returns_once_clients_leave() {
    let (server, mut game) = Server::new(empty_field_config());
    let handle1 = server.register_client("one").await;
    let handle2 = server.register_client("two").await;
    game.step(DT);

    server.unregister_client(handle1.id).await;
    server.unregister_client(handle2.id).await;
    game.step(DT);
    assert_eq!(server.player_count(), 0);

    // With nobody connected the shutdown poll exits immediately.
    server.shutdown(Duration::from_secs(2)).await;
}

#[tokio::test]
async fn test_client_loop_quits_on_q() {
    use client::{Client, Session};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::watch;

    let (server, mut game) = Server::new(empty_field_config());
    let (client_io, test_io) = tokio::io::duplex(1 << 16);
    let (client_read, client_write) = tokio::io::split(client_io);
    let (mut test_read, mut test_write) = tokio::io::split(test_io);

    let (_size_tx, size_rx) = watch::channel((80u16, 24u16));
    let session = Session {
        username: "tester".to_string(),
        has_pty: true,
        size_rx,
        reader: Box::new(client_read),
        writer: Box::new(client_write),
    };

    let client = Client::new(server.clone(), session).await;
    game.step(DT);
    assert_eq!(server.player_count(), 1);

    // Keep the client's output drained so frame writes never block.
    tokio::spawn(async move {
        let mut buf = [0u8; 4096];
        while let Ok(n) = test_read.read(&mut buf).await {
            if n == 0 {
                break;
            }
        }
    });

    test_write.write_all(b"q").await.expect("write q");
    let run = tokio::spawn(client.run());

    let result = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("client loop should exit after q")
        .expect("client task panicked");
    assert!(result.is_ok());

    // The unregistration lands on the next tick.
    game.step(DT);
    assert_eq!(server.player_count(), 0);
}
