//! Server executable: starts the shared game loop, accepts terminal
//! sessions over TCP and runs one client loop per connection. The SSH
//! front end (host keys, auth, PTY allocation) is an external collaborator
//! that drives the same [`client::Session`] contract; this binary fills
//! the contract directly for plain-TCP development sessions.
//!
//! Configuration is environment-only (optionally from `.env`):
//! `SSH_HOST` (default `::`), `SSH_PORT` (default `2222`),
//! `SSH_HOST_KEY` (consumed by the SSH front end).
//!
//! Exit codes: 0 normal, 1 configuration error, 2 bind error.

use client::{Client, Session};
use log::{error, info, warn};
use server::config::get_env;
use server::{Server, ServerConfig};
use std::net::SocketAddr;
use std::process;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

/// Terminal size assumed for transports without resize events.
const DEFAULT_TERM_SIZE: (u16, u16) = (120, 40);

const SHUTDOWN_GRACE: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() {
    env_logger::init();
    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Warning: RUST_LOG environment variable not set. Set it to display logs!");
        eprintln!("Recommended: RUST_LOG=info");
    }

    // A missing .env file is fine; the environment wins either way.
    let _ = dotenvy::dotenv();

    let host = get_env("SSH_HOST", "::");
    let port_raw = get_env("SSH_PORT", "2222");
    let host_key_path = get_env("SSH_HOST_KEY", "/app/keys/host_key");

    let port: u16 = match port_raw.parse() {
        Ok(port) => port,
        Err(err) => {
            error!("invalid SSH_PORT {port_raw:?}: {err}");
            process::exit(1);
        }
    };

    // The host key belongs to the SSH front end; logged for parity with it.
    info!("config: host={host} port={port} host_key={host_key_path}");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (game_server, game_loop) = Server::new(ServerConfig::default());
    tokio::spawn(game_loop.run(shutdown_rx));
    info!("game server started");

    let addr = join_host_port(&host, port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {addr}: {err}");
            process::exit(2);
        }
    };
    info!("listening on {addr}");

    let accept_server = game_server.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let session_server = accept_server.clone();
                    tokio::spawn(async move {
                        handle_session(session_server, stream, peer).await;
                    });
                }
                Err(err) => warn!("accept error: {err}"),
            }
        }
    });

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to wait for shutdown signal: {err}");
    }
    info!("shutting down: notifying connected players");

    game_server.shutdown(SHUTDOWN_GRACE).await;
    let _ = shutdown_tx.send(true);
    info!("game server stopped");
}

/// Wraps one TCP connection into a [`Session`] and runs the client loop on
/// it until the player leaves.
async fn handle_session(game_server: Server, stream: TcpStream, peer: SocketAddr) {
    // Game input is latency sensitive.
    if let Err(err) = stream.set_nodelay(true) {
        warn!("set_nodelay for {peer}: {err}");
    }

    let username = sanitize_username(&format!("guest-{}", peer.port()));
    info!("new session: user={username} peer={peer}");

    let (read_half, write_half) = stream.into_split();
    let (_size_tx, size_rx) = watch::channel(DEFAULT_TERM_SIZE);

    let session = Session {
        username: username.clone(),
        has_pty: true,
        size_rx,
        reader: Box::new(read_half),
        writer: Box::new(write_half),
    };

    if !session.has_pty {
        let mut writer = session.writer;
        let _ = writer
            .write_all(b"Error: PTY required. Please connect with: ssh -t user@host\r\n")
            .await;
        return;
    }

    let client = Client::new(game_server, session).await;
    match client.run().await {
        Ok(()) => info!("session ended: user={username}"),
        Err(err) => warn!("session ended with error: user={username}: {err}"),
    }
}

/// Strips non-graphic characters from a raw login name and caps it at the
/// display limit, preventing terminal escape injection through usernames.
fn sanitize_username(raw: &str) -> String {
    let mut name = String::with_capacity(raw.len());
    for c in raw.chars() {
        if !c.is_ascii_graphic() && !c.is_alphanumeric() {
            continue;
        }
        if name.chars().count() >= shared::tuning::MAX_USERNAME_LENGTH {
            break;
        }
        name.push(c);
    }
    name.trim().to_string()
}

/// Joins host and port, bracketing IPv6 literals.
fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}
