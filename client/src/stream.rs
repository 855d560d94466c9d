//! Background byte-reader feeding the keyboard decoder.

use crate::session::SessionReader;
use shared::input::KeyState;
use shared::Input;
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

/// Non-blocking view over a session's incoming bytes. A background task
/// blocks on the connection and forwards byte batches into a bounded
/// channel; [`InputStream::read_input`] drains whatever arrived since the
/// last frame and derives the key bit-set.
pub struct InputStream {
    rx: mpsc::Receiver<Vec<u8>>,
    keys: KeyState,
    scratch: Vec<u8>,
    closed: bool,
}

impl InputStream {
    /// Spawns the reader task for the given session byte stream.
    pub fn start(mut reader: SessionReader) -> Self {
        let (tx, rx) = mpsc::channel::<Vec<u8>>(32);

        tokio::spawn(async move {
            let mut buf = [0u8; 256];
            loop {
                match reader.read(&mut buf).await {
                    // EOF or error: the connection is gone; dropping the
                    // sender closes the stream.
                    Ok(0) | Err(_) => return,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).await.is_err() {
                            return;
                        }
                    }
                }
            }
        });

        Self {
            rx,
            keys: KeyState::new(),
            scratch: Vec::new(),
            closed: false,
        }
    }

    /// Drains all pending bytes without blocking and returns the decoded
    /// input state for this frame.
    pub fn read_input(&mut self) -> Input {
        let now = Instant::now();
        self.scratch.clear();

        loop {
            match self.rx.try_recv() {
                Ok(bytes) => self.scratch.extend_from_slice(&bytes),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }

        let saw_bytes = !self.scratch.is_empty();
        if saw_bytes {
            self.keys.apply_bytes(&self.scratch, now);
        }
        self.keys.snapshot(now, saw_bytes)
    }

    /// Clears key state, e.g. on screen transitions so a held key does not
    /// leak into gameplay.
    pub fn reset(&mut self) {
        self.keys.reset();
    }

    /// True once the connection closed and all buffered bytes were drained.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_stream_decodes_bytes() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut stream = InputStream::start(Box::new(rx));

        tx.write_all(b"w ").await.unwrap();
        tx.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let input = stream.read_input();
        assert!(input.up);
        assert!(input.space);
        assert!(input.saw_bytes);
        assert!(!stream.is_closed());
    }

    #[tokio::test]
    async fn test_stream_reports_close_after_drain() {
        let (tx, rx) = tokio::io::duplex(64);
        let mut stream = InputStream::start(Box::new(rx));

        drop(tx);
        tokio::time::sleep(Duration::from_millis(20)).await;

        stream.read_input();
        assert!(stream.is_closed());
    }

    #[tokio::test]
    async fn test_read_input_is_nonblocking_when_idle() {
        let (_tx, rx) = tokio::io::duplex(64);
        let mut stream = InputStream::start(Box::new(rx));

        let input = stream.read_input();
        assert!(!input.saw_bytes);
        assert!(!input.up);
    }
}
