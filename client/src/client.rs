//! The per-session frame loop: input, server events, resize handling, the
//! game-phase state machine and frame pacing.

use crate::session::{Session, SessionWriter};
use crate::state::{ClientState, GameState};
use crate::stream::InputStream;
use log::debug;
use server::{ClientHandle, Server};
use shared::draw::{Canvas, ChunkWriter, CLEAR_SCREEN, HIDE_CURSOR, SHOW_CURSOR};
use shared::tuning;
use std::io;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::watch;
use tokio::time::sleep;

/// Clamps terminal dimensions to the max render resolution and computes
/// the centering offset for the render area.
pub(crate) fn clamp_term_size(
    term_width: usize,
    term_height: usize,
) -> (usize, usize, usize, usize) {
    let render_width = term_width.min(tuning::MAX_TERM_WIDTH);
    let render_height = term_height.min(tuning::MAX_TERM_HEIGHT);
    let offset_col = (term_width - render_width) / 2;
    let offset_row = (term_height - render_height) / 2;
    (render_width, render_height, offset_col, offset_row)
}

/// One connected player: owns the session's canvas and writer, holds the
/// server handle, and runs the render loop at the target frame rate.
pub struct Client {
    pub(crate) server: Server,
    pub(crate) handle: ClientHandle,
    pub(crate) state: ClientState,
    pub(crate) canvas: Canvas,
    pub(crate) out: ChunkWriter,
    pub(crate) input: InputStream,
    pub(crate) writer: SessionWriter,
    pub(crate) size_rx: watch::Receiver<(u16, u16)>,
    pub(crate) last_input: Instant,
    pub(crate) delta: f64,
}

impl Client {
    /// Registers with the server and prepares the render surfaces for the
    /// session's initial terminal size.
    pub async fn new(server: Server, session: Session) -> Client {
        let handle = server.register_client(&session.username).await;

        let (term_w, term_h) = *session.size_rx.borrow();
        let (render_w, render_h, offset_col, offset_row) =
            clamp_term_size(term_w as usize, term_h as usize);

        let mut canvas = Canvas::new(
            render_w,
            render_h,
            tuning::VIEW_WIDTH,
            tuning::VIEW_HEIGHT,
        );
        canvas.set_offset(offset_col, offset_row);

        Client {
            server,
            handle,
            state: ClientState::new(),
            canvas,
            out: ChunkWriter::new(offset_col, offset_row),
            input: InputStream::start(session.reader),
            writer: session.writer,
            size_rx: session.size_rx,
            last_input: Instant::now(),
            delta: 0.0,
        }
    }

    /// Runs the client loop until the player quits, goes inactive, the
    /// connection drops or the server shuts down. Always unregisters from
    /// the server on the way out.
    pub async fn run(mut self) -> io::Result<()> {
        self.writer.write_all(HIDE_CURSOR.as_bytes()).await?;
        self.writer.write_all(CLEAR_SCREEN.as_bytes()).await?;
        self.writer.flush().await?;

        let mut last = Instant::now();
        let result = loop {
            if !self.state.running {
                break Ok(());
            }

            let frame_start = Instant::now();
            self.delta = frame_start.duration_since(last).as_secs_f64();
            last = frame_start;

            self.process_input();
            self.process_server_events();
            self.update_screen();

            match self.state.game_state {
                GameState::Start => self.update_start_state().await,
                GameState::Playing => self.update_playing_state(),
                GameState::Dead => self.update_dead_state().await,
                GameState::Shutdown => self.update_shutdown_state(),
            }

            if let Err(err) = self.draw_frame().await {
                break Err(err);
            }

            let elapsed = frame_start.elapsed();
            if elapsed < tuning::CLIENT_TARGET_FRAME_TIME {
                sleep(tuning::CLIENT_TARGET_FRAME_TIME - elapsed).await;
            }
        };

        self.server.unregister_client(self.handle.id).await;
        debug!("client {} loop ended", self.handle.id);

        // Best effort: the connection may already be gone.
        let _ = self.writer.write_all(CLEAR_SCREEN.as_bytes()).await;
        let _ = self.writer.write_all(SHOW_CURSOR.as_bytes()).await;
        let _ = self.writer.flush().await;

        result
    }

    /// Reads this frame's input, tracks inactivity, and forwards the input
    /// to the server while playing.
    fn process_input(&mut self) {
        self.state.input = self.input.read_input();

        if self.input.is_closed() {
            self.state.running = false;
            return;
        }

        if self.state.input.saw_bytes {
            self.last_input = Instant::now();
            self.state.is_inactive = false;
        } else {
            let idle = self.last_input.elapsed().as_secs_f64();
            if idle > tuning::INACTIVITY_DISCONNECT_SECONDS {
                self.state.running = false;
            } else if idle > tuning::INACTIVITY_WARN_SECONDS {
                self.state.is_inactive = true;
            }
        }

        if self.state.input.quit {
            self.state.running = false;
        }

        if self.state.game_state == GameState::Playing {
            self.server.send_input(self.handle.id, self.state.input);
        }
    }

    /// Drains pending server events without blocking. A closed channel
    /// means the server is gone; stop the loop.
    fn process_server_events(&mut self) {
        loop {
            match self.handle.events.try_recv() {
                Ok(event) => self.state.apply_event(event),
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    self.state.running = false;
                    return;
                }
            }
        }
    }

    /// Polls the terminal size; on any change of render size or offset,
    /// clears the terminal and forces a full redraw so no residual cells
    /// survive outside the new canvas area.
    fn update_screen(&mut self) {
        let (term_w, term_h) = *self.size_rx.borrow();
        let (render_w, render_h, offset_col, offset_row) =
            clamp_term_size(term_w as usize, term_h as usize);

        if render_w != self.canvas.term_width()
            || render_h != self.canvas.term_height()
            || offset_col != self.canvas.offset_col()
            || offset_row != self.canvas.offset_row()
        {
            self.out.push_str(CLEAR_SCREEN);
            self.canvas.force_redraw();
        }

        self.canvas.resize(render_w, render_h);
        self.canvas.set_offset(offset_col, offset_row);
        self.out.set_offset(offset_col, offset_row);
    }

    async fn update_start_state(&mut self) {
        if self.state.input.space || self.state.input.enter {
            self.start_game().await;
        }
    }

    fn update_playing_state(&mut self) {
        if self.state.invincible_time > 0.0 {
            self.state.invincible_time = (self.state.invincible_time - self.delta).max(0.0);
        }

        // Camera follows this client's ship from the latest snapshot.
        self.state.ship = self.server.client_ship(self.handle.id);
        if let Some(ship) = &self.state.ship {
            self.state.camera.x = ship.x;
            self.state.camera.y = ship.y;
        }
    }

    async fn update_dead_state(&mut self) {
        if self.state.respawn_remaining > 0.0 {
            self.state.respawn_remaining = (self.state.respawn_remaining - self.delta).max(0.0);
        }
        if (self.state.input.space || self.state.input.enter) && self.state.respawn_remaining <= 0.0
        {
            self.start_game().await;
        }
    }

    fn update_shutdown_state(&mut self) {
        self.state.shutdown_timer -= self.delta;
        if self.state.shutdown_timer <= 0.0 {
            self.state.running = false;
        }
    }

    /// Starts or restarts gameplay: resets the run on a fresh start or
    /// after the last life, asks the server for a ship, and grants the
    /// local invincibility used for the blink overlay.
    async fn start_game(&mut self) {
        self.input.reset();

        if self.state.game_state == GameState::Start || self.state.lives <= 0 {
            self.state.score = 0;
            self.state.lives = tuning::INITIAL_LIVES;
        }

        self.server.spawn_player(self.handle.id).await;
        self.state.ship = self.server.client_ship(self.handle.id);
        if let Some(ship) = &self.state.ship {
            self.state.camera.x = ship.x;
            self.state.camera.y = ship.y;
        }

        self.state.invincible_time = tuning::INVINCIBILITY_SECONDS;
        self.state.game_state = GameState::Playing;
    }

    pub(crate) async fn flush(&mut self) -> io::Result<()> {
        for chunk in self.out.chunks() {
            self.writer.write_all(chunk).await?;
        }
        self.writer.flush().await?;
        self.out.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_small_terminal_untouched() {
        let (w, h, oc, or) = clamp_term_size(80, 24);
        assert_eq!((w, h, oc, or), (80, 24, 0, 0));
    }

    #[test]
    fn test_clamp_oversized_terminal_centers() {
        let (w, h, oc, or) = clamp_term_size(200, 60);
        assert_eq!(w, tuning::MAX_TERM_WIDTH);
        assert_eq!(h, tuning::MAX_TERM_HEIGHT);
        assert_eq!(oc, (200 - tuning::MAX_TERM_WIDTH) / 2);
        assert_eq!(or, (60 - tuning::MAX_TERM_HEIGHT) / 2);
    }

    #[test]
    fn test_clamp_zero_terminal() {
        let (w, h, oc, or) = clamp_term_size(0, 0);
        assert_eq!((w, h, oc, or), (0, 0, 0, 0));
    }
}
