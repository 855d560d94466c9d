//! The authoritative server: a single task owns the world and advances it
//! at a fixed tick rate; clients talk to it through bounded channels and
//! read the world through atomically published snapshots.

use crate::collision::check_collisions;
use crate::state::{TopScoreEntry, WorldSnapshot, WorldState};
use log::{info, warn};
use rand::Rng;
use shared::object::{AsteroidSpawner, GameObject, Ship};
use shared::{tuning, Bounds, Input};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, Instant};

/// Events sent from the server to a client. Delivery is best-effort: when a
/// client's channel is full the event is dropped, and the client catches up
/// through the next snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    /// Points awarded for a kill by this client's projectile.
    ScoreAdd(i64),
    /// This client's ship was destroyed.
    PlayerDied,
    /// The server is shutting down; disconnect soon.
    ServerShutdown,
}

/// A client's connection to the server, returned by registration. Dropping
/// the handle does not unregister; call
/// [`Server::unregister_client`] when the session ends.
pub struct ClientHandle {
    pub id: i32,
    pub username: Arc<str>,
    /// Server-to-client events. Closed when the server unregisters the
    /// client or shuts down.
    pub events: mpsc::Receiver<ClientEvent>,
}

/// Server-side per-client record. Lives in the registry; mutated only
/// under the registry lock.
pub(crate) struct ClientEntry {
    pub(crate) id: i32,
    pub(crate) username: Arc<str>,
    pub(crate) events: mpsc::Sender<ClientEvent>,
    /// Most recently delivered input; older inputs are overwritten.
    pub(crate) input: Input,
    pub(crate) invincible_time: f64,
    /// True iff this client's ship is currently present in the world.
    pub(crate) ship_alive: bool,
    pub(crate) score: i64,
}

enum Command {
    Register(ClientEntry),
    Unregister(i32),
    SpawnShip(i32),
    RemoveShip(i32),
}

struct ClientInput {
    client_id: i32,
    input: Input,
}

/// Server tuning; defaults come from the tuning table.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub world: Bounds,
    pub asteroid_target: i32,
    pub tick_time: Duration,
    pub invincibility_seconds: f64,
    /// Leaderboard length in each snapshot.
    pub top_scores: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            world: Bounds::new(tuning::WORLD_WIDTH, tuning::WORLD_HEIGHT),
            asteroid_target: tuning::INITIAL_ASTEROID_TARGET,
            tick_time: tuning::SERVER_TICK_TIME,
            invincibility_seconds: tuning::INVINCIBILITY_SECONDS,
            top_scores: 5,
        }
    }
}

struct SharedState {
    clients: RwLock<HashMap<i32, ClientEntry>>,
    snapshot: RwLock<Arc<WorldSnapshot>>,
    next_client_id: AtomicI32,
}

// Lock guards are only held for short critical sections with no await
// points; a poisoned lock (panicked tick) still yields usable state.
fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

/// Cheap-to-clone handle for talking to the game loop. All world mutation
/// is funnelled through bounded channels drained at the top of each tick;
/// reads go through the registry lock or the published snapshot.
#[derive(Clone)]
pub struct Server {
    shared: Arc<SharedState>,
    cmd_tx: mpsc::Sender<Command>,
    input_tx: mpsc::Sender<ClientInput>,
}

impl Server {
    /// Creates the server handle and the game loop that owns the world.
    /// Spawn [`GameLoop::run`] on the runtime (or drive it manually with
    /// [`GameLoop::step`] in tests).
    pub fn new(config: ServerConfig) -> (Server, GameLoop) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (input_tx, input_rx) = mpsc::channel(256);

        let shared = Arc::new(SharedState {
            clients: RwLock::new(HashMap::new()),
            snapshot: RwLock::new(Arc::new(WorldSnapshot {
                world: config.world,
                ..WorldSnapshot::default()
            })),
            next_client_id: AtomicI32::new(1),
        });

        let mut world = WorldState::new(config.world);
        world.add_object(GameObject::Spawner(AsteroidSpawner::new(
            config.asteroid_target,
        )));

        let server = Server {
            shared: shared.clone(),
            cmd_tx,
            input_tx,
        };
        let game_loop = GameLoop {
            world,
            shared,
            cmd_rx,
            input_rx,
            config,
            spare_snapshot: None,
            tick_count: 0,
        };

        (server, game_loop)
    }

    /// Registers a new client. The handle is returned immediately; the
    /// registry insertion happens at the top of the next tick.
    pub async fn register_client(&self, username: &str) -> ClientHandle {
        let id = self.shared.next_client_id.fetch_add(1, Ordering::Relaxed);
        let username: Arc<str> = Arc::from(username);
        let (events_tx, events_rx) = mpsc::channel(16);

        let entry = ClientEntry {
            id,
            username: username.clone(),
            events: events_tx,
            input: Input::default(),
            invincible_time: 0.0,
            ship_alive: false,
            score: 0,
        };
        if self.cmd_tx.send(Command::Register(entry)).await.is_err() {
            warn!("register: game loop is gone");
        }

        ClientHandle {
            id,
            username,
            events: events_rx,
        }
    }

    /// Removes a client: its ship leaves the world and its events channel
    /// closes at the next tick.
    pub async fn unregister_client(&self, client_id: i32) {
        if self
            .cmd_tx
            .send(Command::Unregister(client_id))
            .await
            .is_err()
        {
            warn!("unregister: game loop is gone");
        }
    }

    /// Delivers a client's latest input. Never blocks; when the channel is
    /// full the newest input is dropped, which is safe because inputs are
    /// full key state and the next send supersedes the loss.
    pub fn send_input(&self, client_id: i32, input: Input) {
        let _ = self.input_tx.try_send(ClientInput { client_id, input });
    }

    /// Asks the server to spawn (or respawn) this client's ship at a
    /// random position with spawn invincibility.
    pub async fn spawn_player(&self, client_id: i32) {
        let _ = self.cmd_tx.send(Command::SpawnShip(client_id)).await;
    }

    /// Removes this client's ship without unregistering the client.
    pub async fn remove_player(&self, client_id: i32) {
        let _ = self.cmd_tx.send(Command::RemoveShip(client_id)).await;
    }

    /// The most recently published world snapshot. Hold it for one render
    /// frame only.
    pub fn snapshot(&self) -> Arc<WorldSnapshot> {
        read_lock(&self.shared.snapshot).clone()
    }

    /// This client's ship as of the latest snapshot, if it is alive.
    pub fn client_ship(&self, client_id: i32) -> Option<Ship> {
        self.snapshot().ship_of(client_id).cloned()
    }

    /// Number of registered clients.
    pub fn player_count(&self) -> usize {
        read_lock(&self.shared.clients).len()
    }

    /// Graceful shutdown: notifies every connected client, then polls the
    /// client count every 200ms until everyone disconnected or the
    /// deadline passes. The caller stops the game loop afterwards.
    pub async fn shutdown(&self, timeout: Duration) {
        {
            let clients = read_lock(&self.shared.clients);
            info!("shutdown: notifying {} client(s)", clients.len());
            for entry in clients.values() {
                let _ = entry.events.try_send(ClientEvent::ServerShutdown);
            }
        }

        let deadline = Instant::now() + timeout;
        loop {
            if self.player_count() == 0 {
                info!("shutdown: all clients disconnected");
                return;
            }
            if Instant::now() >= deadline {
                warn!(
                    "shutdown: timeout with {} client(s) still connected",
                    self.player_count()
                );
                return;
            }
            sleep(Duration::from_millis(200)).await;
        }
    }
}

/// Owns the world and advances it. Exactly one of these exists per server;
/// all entity mutation happens on its task.
pub struct GameLoop {
    world: WorldState,
    shared: Arc<SharedState>,
    cmd_rx: mpsc::Receiver<Command>,
    input_rx: mpsc::Receiver<ClientInput>,
    config: ServerConfig,
    /// The previously published snapshot; its buffers are reused once all
    /// readers released it (double buffering without reallocation).
    spare_snapshot: Option<Arc<WorldSnapshot>>,
    tick_count: u64,
}

impl GameLoop {
    /// Runs the fixed-tick loop until the shutdown signal flips to true.
    pub async fn run(mut self, shutdown: watch::Receiver<bool>) {
        info!(
            "game loop started: world {}x{}, asteroid target {}",
            self.config.world.width, self.config.world.height, self.config.asteroid_target
        );

        let mut last = Instant::now();
        loop {
            if *shutdown.borrow() {
                info!("game loop stopped");
                return;
            }

            let frame_start = Instant::now();
            let dt = frame_start.duration_since(last).as_secs_f64();
            last = frame_start;

            self.step(dt);

            if self.tick_count % 300 == 0 {
                info!(
                    "status: {} client(s), {} entities, asteroid weight {}",
                    self.shared_client_count(),
                    self.world.objects.len(),
                    self.world.asteroid_weight
                );
            }

            let elapsed = frame_start.elapsed();
            if elapsed < self.config.tick_time {
                sleep(self.config.tick_time - elapsed).await;
            }
        }
    }

    /// One full tick: drain control channels, integrate, collide, publish.
    /// Public so tests can drive the pipeline deterministically.
    pub fn step(&mut self, dt: f64) {
        self.drain_commands();
        self.drain_inputs();
        self.update_world(dt);
        self.publish_snapshot();
        self.tick_count += 1;
    }

    /// Direct world access for integration tests and scenario setup.
    pub fn world_mut(&mut self) -> &mut WorldState {
        &mut self.world
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    fn shared_client_count(&self) -> usize {
        read_lock(&self.shared.clients).len()
    }

    /// Applies registrations, unregistrations and ship spawn/remove
    /// requests until the command channel is empty.
    fn drain_commands(&mut self) {
        let mut clients = write_lock(&self.shared.clients);

        while let Ok(cmd) = self.cmd_rx.try_recv() {
            match cmd {
                Command::Register(entry) => {
                    info!("client {} ({}) registered", entry.id, entry.username);
                    clients.insert(entry.id, entry);
                }
                Command::Unregister(client_id) => {
                    if let Some(entry) = clients.remove(&client_id) {
                        if entry.ship_alive {
                            self.world.remove_ship(client_id);
                        }
                        info!("client {} ({}) unregistered", entry.id, entry.username);
                        // Dropping the entry closes its events channel.
                    }
                }
                Command::SpawnShip(client_id) => {
                    if let Some(entry) = clients.get_mut(&client_id) {
                        if entry.ship_alive {
                            self.world.remove_ship(client_id);
                        }
                        let mut rng = rand::thread_rng();
                        let x = rng.gen_range(0.0..self.config.world.width);
                        let y = rng.gen_range(0.0..self.config.world.height);
                        self.world.add_object(GameObject::Ship(Ship::new(
                            x,
                            y,
                            client_id,
                            entry.username.clone(),
                        )));
                        entry.ship_alive = true;
                        entry.invincible_time = self.config.invincibility_seconds;
                    }
                }
                Command::RemoveShip(client_id) => {
                    if let Some(entry) = clients.get_mut(&client_id) {
                        if entry.ship_alive {
                            self.world.remove_ship(client_id);
                            entry.ship_alive = false;
                        }
                    }
                }
            }
        }
    }

    /// Stores each client's most recently delivered input on its entry.
    fn drain_inputs(&mut self) {
        let mut clients = write_lock(&self.shared.clients);
        while let Ok(ci) = self.input_rx.try_recv() {
            if let Some(entry) = clients.get_mut(&ci.client_id) {
                entry.input = ci.input;
            }
        }
    }

    fn update_world(&mut self, dt: f64) {
        let mut clients = write_lock(&self.shared.clients);

        for entry in clients.values_mut() {
            if entry.invincible_time > 0.0 {
                entry.invincible_time = (entry.invincible_time - dt).max(0.0);
            }
        }

        let failures = self
            .world
            .update_entities(dt, |owner_id| clients.get(&owner_id).map(|e| e.input));

        // The tick never aborts: failures are logged, and a client whose
        // entity raised is unregistered.
        for failure in failures {
            warn!("{}", failure.error);
            if let Some(owner_id) = failure.owner_id {
                if clients.remove(&owner_id).is_some() {
                    self.world.remove_ship(owner_id);
                    warn!("client {owner_id} unregistered after entity failure");
                }
            }
        }

        check_collisions(&mut self.world, &mut clients);
    }

    /// Builds the tick's snapshot and publishes it with an atomic pointer
    /// swap. The previous snapshot becomes the spare; once every reader
    /// drops it, its buffers are reused for a later tick.
    fn publish_snapshot(&mut self) {
        let mut snap = self
            .spare_snapshot
            .take()
            .and_then(|arc| Arc::try_unwrap(arc).ok())
            .unwrap_or_default();

        snap.objects.clone_from(&self.world.objects);
        snap.ships.clear();
        snap.ships.extend(
            self.world
                .objects
                .iter()
                .filter_map(GameObject::as_ship)
                .cloned(),
        );
        snap.world = self.world.world;
        snap.dt = self.world.dt;

        {
            let clients = read_lock(&self.shared.clients);
            snap.players = clients.len();
            snap.top_scores.clear();
            snap.top_scores
                .extend(clients.values().map(|entry| TopScoreEntry {
                    username: entry.username.clone(),
                    score: entry.score,
                    client_id: entry.id,
                }));
        }
        snap.top_scores
            .sort_by(|a, b| b.score.cmp(&a.score).then(a.client_id.cmp(&b.client_id)));
        snap.top_scores.truncate(self.config.top_scores);

        let published = Arc::new(snap);
        let previous = {
            let mut cell = write_lock(&self.shared.snapshot);
            std::mem::replace(&mut *cell, published)
        };
        self.spare_snapshot = Some(previous);
    }
}
