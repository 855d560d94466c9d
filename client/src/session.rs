//! The boundary contract with the connection host (SSH server, TCP
//! listener, test harness): a session is a byte stream pair plus terminal
//! metadata. The client core consumes this and knows nothing about key
//! exchange, authentication or channel multiplexing.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;

pub type SessionReader = Box<dyn AsyncRead + Send + Unpin>;
pub type SessionWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// One connected terminal session.
pub struct Session {
    /// Login name, already sanitized by the transport.
    pub username: String,
    /// Whether the session allocated a PTY; the game refuses to run
    /// without one.
    pub has_pty: bool,
    /// Terminal size in (columns, rows); the transport pushes resize
    /// events into the channel.
    pub size_rx: watch::Receiver<(u16, u16)>,
    pub reader: SessionReader,
    pub writer: SessionWriter,
}
