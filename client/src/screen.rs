//! Frame composition: world rendering, HUD, screens and the minimap.

use crate::client::Client;
use crate::state::GameState;
use server::WorldSnapshot;
use shared::draw::{
    BLOCK_FULL, BLOCK_LOWER_HALF, BLOCK_UPPER_HALF, BOX_HORIZONTAL, CLEAR_SCREEN,
    COLOR_BRIGHT_CYAN, COLOR_RESET,
};
use shared::geometry::world_to_screen;
use shared::object::{DrawContext, Ship};
use shared::tuning;
use shared::Bounds;
use std::io;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

const MINIMAP_WIDTH: usize = 24;
const MINIMAP_HEIGHT: usize = 6;
const MINIMAP_SUB_ROWS: usize = MINIMAP_HEIGHT * 2;

pub(crate) type MinimapGrid = [[u8; MINIMAP_WIDTH]; MINIMAP_SUB_ROWS];

const REPO_URL: &str = "https://github.com/termroids/termroids";

const TITLE_ART: [&str; 5] = [
    r"  _____ ___ ___ __  __ ___  ___ ___ ___  ___  ",
    r" |_   _| __| _ \  \/  | _ \/ _ \_ _|   \/ __| ",
    r"   | | | _||   / |\/| |   / (_) | || |) \__ \ ",
    r"   |_| |___|_|_\_|  |_|_|_\\___/___|___/|___/ ",
    r"                                              ",
];

const DIED_ART: [&str; 5] = [
    r" __   _____  _   _   ___ ___ ___ ___   ",
    r" \ \ / / _ \| | | | |   \_ _| __|   \  ",
    r"  \ V / (_) | |_| | | |) | || _|| |) | ",
    r"   |_| \___/ \___/  |___/___|___|___/  ",
    r"                                       ",
];

const GAME_OVER_ART: [&str; 5] = [
    r"   ___   _   __  __ ___    _____   _____ ___  ",
    r"  / __| /_\ |  \/  | __|  / _ \ \ / / __| _ \ ",
    r" | (_ |/ _ \| |\/| | _|  | (_) \ V /| _||   / ",
    r"  \___/_/ \_\_|  |_|___|  \___/ \_/ |___|_|_\ ",
    r"                                              ",
];

/// 600ms on/off phase for blinking prompts.
fn blink_on() -> bool {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    (millis / 600) % 2 == 0
}

/// Maps all ships onto the minimap grid: 0 empty, 1 other player, 2 self
/// (self wins the cell).
pub(crate) fn fill_minimap_grid(
    grid: &mut MinimapGrid,
    ships: &[Ship],
    own_id: i32,
    world: Bounds,
) {
    if world.width <= 0.0 || world.height <= 0.0 {
        return;
    }

    for ship in ships {
        let col = ((ship.x / world.width * MINIMAP_WIDTH as f64) as i64)
            .clamp(0, MINIMAP_WIDTH as i64 - 1) as usize;
        let sub_row = ((ship.y / world.height * MINIMAP_SUB_ROWS as f64) as i64)
            .clamp(0, MINIMAP_SUB_ROWS as i64 - 1) as usize;

        if ship.owner_id == own_id {
            grid[sub_row][col] = 2;
        } else if grid[sub_row][col] == 0 {
            grid[sub_row][col] = 1;
        }
    }
}

impl Client {
    /// Composes and transmits one frame: canvas diff, border, name
    /// overlays and the UI for the current game phase.
    pub(crate) async fn draw_frame(&mut self) -> io::Result<()> {
        // Full terminal clear on phase or inactivity transitions so UI from
        // the previous screen never lingers.
        let state_changed = self.state.game_state != self.state.prev_game_state;
        let inactive_changed = self.state.is_inactive != self.state.was_inactive;
        if state_changed || inactive_changed {
            self.out.push_str(CLEAR_SCREEN);
            self.canvas.force_redraw();
            self.state.prev_game_state = self.state.game_state;
            self.state.was_inactive = self.state.is_inactive;
        }

        self.canvas.clear();

        let snapshot = self.server.snapshot();
        {
            let mut ctx = DrawContext {
                canvas: &mut self.canvas,
                camera: self.state.camera,
                view: self.state.view,
                world: snapshot.world,
            };

            for obj in &snapshot.objects {
                // The local ship blinks while invincible.
                if let Some(ship) = obj.as_ship() {
                    if ship.owner_id == self.handle.id
                        && !Ship::visible_while_invincible(self.state.invincible_time)
                    {
                        continue;
                    }
                }
                obj.draw(&mut ctx);
            }
        }

        self.canvas.render(&mut self.out);
        self.canvas.render_border(&mut self.out);
        self.draw_player_names(&snapshot);
        self.draw_ui(&snapshot);

        self.flush().await
    }

    fn draw_ui(&mut self, snapshot: &WorldSnapshot) {
        let term_width = self.canvas.term_width();
        let term_height = self.canvas.term_height();
        if term_width == 0 || term_height == 0 {
            return;
        }
        let center_x = term_width / 2;
        let center_y = term_height / 2;

        if self.state.game_state == GameState::Shutdown {
            self.draw_shutdown_screen(center_x, center_y);
            return;
        }

        if self.state.is_inactive {
            self.draw_inactivity_screen(center_x, center_y);
            return;
        }

        match self.state.game_state {
            GameState::Playing => self.draw_playing_hud(term_width, term_height, snapshot),
            GameState::Start => self.draw_start_screen(center_x, center_y),
            GameState::Dead => self.draw_dead_screen(center_x, center_y, snapshot),
            GameState::Shutdown => {}
        }
    }

    fn write_centered(&mut self, center_col: usize, row: usize, text: &str) {
        let col = center_col
            .saturating_sub(text.chars().count() / 2)
            .max(1);
        self.out.write_at(col, row.max(1), text);
    }

    fn draw_start_screen(&mut self, center_x: usize, center_y: usize) {
        let title_start_y = center_y.saturating_sub(7);
        for (i, line) in TITLE_ART.iter().enumerate() {
            self.write_centered(center_x, title_start_y + i, line);
        }

        let subtitle = "~ Multiplayer Asteroids in your terminal ~";
        self.write_centered(center_x, title_start_y + TITLE_ART.len() + 1, subtitle);

        let controls_y = title_start_y + TITLE_ART.len() + 3;
        self.write_centered(center_x, controls_y, "Controls");
        let control_lines = [
            "W / Up  . . . . Thrust",
            "A D / < >  . .  Rotate",
            "SPACE  . . . . . Shoot",
            "Q  . . . . . . .  Quit",
        ];
        for (i, line) in control_lines.iter().enumerate() {
            self.write_centered(center_x, controls_y + 1 + i, line);
        }

        if blink_on() {
            let prompt = ">>  Press SPACE to Start  <<";
            self.write_centered(center_x, controls_y + control_lines.len() + 2, prompt);
        }

        // OSC 8 clickable hyperlink; the label length drives centering.
        let label = "Click to view the project";
        let link = format!("\x1b]8;;{REPO_URL}\x1b\\{label}\x1b]8;;\x1b\\");
        let col = center_x.saturating_sub(label.len() / 2).max(1);
        self.out
            .write_at(col, controls_y + control_lines.len() + 4, &link);
    }

    /// Fixed-width HUD fields so shrinking values never leave residual
    /// characters behind (the screen is not cleared every frame).
    fn draw_playing_hud(
        &mut self,
        term_width: usize,
        term_height: usize,
        snapshot: &WorldSnapshot,
    ) {
        let score_text = format!("Score: {:<8}", self.state.score);
        self.out.write_at(2, 1, &score_text);

        let lives_text = format!("Lives: {:<3}", self.state.lives);
        let lives_col = term_width.saturating_sub(lives_text.len() + 1).max(1);
        self.out.write_at(lives_col, 1, &lives_text);

        if self.state.ship.is_some() {
            self.draw_minimap(term_width, term_height, snapshot);
        }

        let players_text = format!("Players: {:<4}", snapshot.players);
        let players_col = term_width.saturating_sub(players_text.len() + 1).max(1);
        self.out.write_at(players_col, term_height, &players_text);

        if let Some(ship) = &self.state.ship {
            let coord_text = format!("X:{:<5.0} Y:{:<5.0}", ship.x, ship.y);
            self.out.write_at(2, term_height, &coord_text);
        }
    }

    /// A small overview of the whole world in the top-right corner,
    /// rendered with half-blocks for 2x vertical resolution. Self is
    /// bright cyan, other players are plain.
    fn draw_minimap(&mut self, term_width: usize, term_height: usize, snapshot: &WorldSnapshot) {
        let mut grid: MinimapGrid = [[0; MINIMAP_WIDTH]; MINIMAP_SUB_ROWS];
        fill_minimap_grid(&mut grid, &snapshot.ships, self.handle.id, snapshot.world);

        // Below the lives display, right-aligned with border and padding.
        let Some(start_col) = term_width.checked_sub(MINIMAP_WIDTH + 3) else {
            return;
        };
        let start_row = 3;
        if start_col < 1 || start_row + MINIMAP_HEIGHT + 1 > term_height {
            return;
        }

        let horizontal: String = std::iter::repeat(BOX_HORIZONTAL)
            .take(MINIMAP_WIDTH)
            .collect();

        self.out
            .write_at(start_col, start_row, &format!("┌{horizontal}┐"));
        self.canvas
            .mark_text_dirty(start_col, start_row, MINIMAP_WIDTH + 2);

        for term_row in 0..MINIMAP_HEIGHT {
            self.out.write_at(start_col, start_row + 1 + term_row, "│");

            let mut color_active = false;
            for col in 0..MINIMAP_WIDTH {
                let top = grid[term_row * 2][col];
                let bottom = grid[term_row * 2 + 1][col];
                let is_self = top == 2 || bottom == 2;

                let glyph = match (top != 0, bottom != 0) {
                    (true, true) => BLOCK_FULL,
                    (true, false) => BLOCK_UPPER_HALF,
                    (false, true) => BLOCK_LOWER_HALF,
                    (false, false) => ' ',
                };

                if glyph != ' ' {
                    if is_self && !color_active {
                        self.out.push_str(COLOR_BRIGHT_CYAN);
                        color_active = true;
                    } else if !is_self && color_active {
                        self.out.push_str(COLOR_RESET);
                        color_active = false;
                    }
                } else if color_active {
                    self.out.push_str(COLOR_RESET);
                    color_active = false;
                }
                self.out.push_char(glyph);
            }
            if color_active {
                self.out.push_str(COLOR_RESET);
            }

            self.out.push_char('│');
            self.canvas
                .mark_text_dirty(start_col, start_row + 1 + term_row, MINIMAP_WIDTH + 2);
        }

        self.out.write_at(
            start_col,
            start_row + 1 + MINIMAP_HEIGHT,
            &format!("└{horizontal}┘"),
        );
        self.canvas
            .mark_text_dirty(start_col, start_row + 1 + MINIMAP_HEIGHT, MINIMAP_WIDTH + 2);
    }

    fn draw_dead_screen(&mut self, center_x: usize, center_y: usize, snapshot: &WorldSnapshot) {
        let art: &[&str] = if self.state.lives > 0 {
            &DIED_ART
        } else {
            &GAME_OVER_ART
        };

        let title_start_y = center_y.saturating_sub(6);
        for (i, line) in art.iter().enumerate() {
            self.write_centered(center_x, title_start_y + i, line);
        }

        let score_text = format!("Score: {}", self.state.score);
        self.write_centered(center_x, title_start_y + art.len() + 1, &score_text);

        if self.state.lives > 0 {
            let lives_text = format!("Lives remaining: {}", self.state.lives);
            self.write_centered(center_x, title_start_y + art.len() + 3, &lives_text);
        }

        if self.state.respawn_remaining > 0.0 {
            let countdown = format!("Respawn in {:.1} seconds...", self.state.respawn_remaining);
            self.write_centered(center_x, title_start_y + art.len() + 5, &countdown);
        } else if blink_on() {
            let prompt = if self.state.lives > 0 {
                ">>  Press SPACE to Continue  <<"
            } else {
                ">>  Press SPACE to Restart  <<"
            };
            self.write_centered(center_x, title_start_y + art.len() + 5, prompt);
        }

        if !snapshot.top_scores.is_empty() {
            let board_y = title_start_y + art.len() + 7;
            self.write_centered(center_x, board_y, "Top pilots");
            for (i, entry) in snapshot.top_scores.iter().enumerate() {
                let line = format!("{:<16} {:>6}", entry.username, entry.score);
                self.write_centered(center_x, board_y + 1 + i, &line);
            }
        }
    }

    fn draw_shutdown_screen(&mut self, center_x: usize, center_y: usize) {
        self.write_centered(center_x, center_y.saturating_sub(3), "SERVER SHUTTING DOWN");
        self.write_centered(
            center_x,
            center_y.saturating_sub(1),
            "The server is restarting for maintenance.",
        );
        self.write_centered(center_x, center_y, "Please reconnect in a moment.");

        let remaining = self.state.shutdown_timer.max(0.0) as i64 + 1;
        let countdown = format!("Disconnecting in {remaining} seconds...");
        self.write_centered(center_x, center_y + 2, &countdown);

        self.write_centered(center_x, center_y + 4, "Press Q to disconnect now");
    }

    fn draw_inactivity_screen(&mut self, center_x: usize, center_y: usize) {
        self.write_centered(center_x, center_y.saturating_sub(2), "INACTIVITY WARNING");

        let remaining =
            (tuning::INACTIVITY_DISCONNECT_SECONDS - self.last_input.elapsed().as_secs_f64())
                .max(0.0) as i64;
        let msg = format!(
            "You have been inactive for too long. You will be disconnected in {remaining} seconds."
        );
        self.write_centered(center_x, center_y, &msg);

        self.write_centered(center_x, center_y + 2, "Press any key to continue");
    }

    /// Draws usernames above other players' ships, marking the cells dirty
    /// so the canvas restores them next frame as the ships move.
    fn draw_player_names(&mut self, snapshot: &Arc<WorldSnapshot>) {
        let term_width = self.canvas.term_width() as i64;
        let term_height = self.canvas.term_height() as i64;

        for ship in &snapshot.ships {
            if ship.owner_id == self.handle.id || ship.username.is_empty() {
                continue;
            }

            let name_len = ship.username.chars().count() as i64;
            for pos in
                world_to_screen(ship.x, ship.y, self.state.camera, self.state.view, snapshot.world)
                    .iter()
            {
                let (mut col, row) = self
                    .canvas
                    .logical_to_terminal(pos.x, pos.y - ship.radius - 2.0);
                col -= name_len / 2;

                if row < 1 || row > term_height {
                    continue;
                }
                if col < 1 || col + name_len > term_width {
                    continue;
                }

                self.out
                    .write_at(col as usize, row as usize, &ship.username);
                self.canvas
                    .mark_text_dirty(col as usize, row as usize, name_len as usize);
            }
        }
    }
}
