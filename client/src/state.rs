//! Per-client session state and the game-phase state machine.

use server::ClientEvent;
use shared::object::Ship;
use shared::{tuning, Bounds, Camera, Input};

/// The client's game phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    /// Title screen.
    Start,
    /// Active gameplay.
    Playing,
    /// Ship destroyed; waiting for respawn or restart.
    Dead,
    /// Server is shutting down; countdown to disconnect.
    Shutdown,
}

/// Everything one client session tracks between frames.
pub struct ClientState {
    pub input: Input,
    pub view: Bounds,
    pub camera: Camera,
    pub game_state: GameState,
    pub prev_game_state: GameState,
    /// This client's ship as of the latest snapshot, if alive.
    pub ship: Option<Ship>,
    pub score: i64,
    pub lives: i32,
    pub invincible_time: f64,
    pub respawn_remaining: f64,
    pub shutdown_timer: f64,
    pub running: bool,
    pub is_inactive: bool,
    pub was_inactive: bool,
}

impl ClientState {
    pub fn new() -> Self {
        Self {
            input: Input::default(),
            view: Bounds::new(tuning::VIEW_WIDTH, tuning::VIEW_HEIGHT),
            camera: Camera {
                x: tuning::WORLD_WIDTH / 2.0,
                y: tuning::WORLD_HEIGHT / 2.0,
            },
            game_state: GameState::Start,
            prev_game_state: GameState::Start,
            ship: None,
            score: 0,
            lives: tuning::INITIAL_LIVES,
            invincible_time: 0.0,
            respawn_remaining: 0.0,
            shutdown_timer: 0.0,
            running: true,
            is_inactive: false,
            was_inactive: false,
        }
    }

    /// Applies one server event to the session state. A closed event
    /// channel is handled by the caller, not here.
    pub fn apply_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::ScoreAdd(points) => {
                self.score += points;
            }
            ClientEvent::PlayerDied => {
                self.lives -= 1;
                self.game_state = GameState::Dead;
                self.ship = None;
                self.respawn_remaining = tuning::RESPAWN_TIMEOUT_SECONDS;
            }
            ClientEvent::ServerShutdown => {
                self.game_state = GameState::Shutdown;
                self.shutdown_timer = tuning::SHUTDOWN_DISPLAY_SECONDS;
            }
        }
    }
}

impl Default for ClientState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_starts_on_title_screen() {
        let state = ClientState::new();
        assert_eq!(state.game_state, GameState::Start);
        assert_eq!(state.lives, tuning::INITIAL_LIVES);
        assert!(state.running);
    }

    #[test]
    fn test_score_event_accumulates() {
        let mut state = ClientState::new();
        state.apply_event(ClientEvent::ScoreAdd(20));
        state.apply_event(ClientEvent::ScoreAdd(50));
        assert_eq!(state.score, 70);
    }

    #[test]
    fn test_death_event_transitions_to_dead() {
        let mut state = ClientState::new();
        state.game_state = GameState::Playing;

        state.apply_event(ClientEvent::PlayerDied);
        assert_eq!(state.game_state, GameState::Dead);
        assert_eq!(state.lives, tuning::INITIAL_LIVES - 1);
        assert!(state.ship.is_none());
        assert!(state.respawn_remaining > 0.0);
    }

    #[test]
    fn test_shutdown_event_from_any_state() {
        for phase in [GameState::Start, GameState::Playing, GameState::Dead] {
            let mut state = ClientState::new();
            state.game_state = phase;
            state.apply_event(ClientEvent::ServerShutdown);
            assert_eq!(state.game_state, GameState::Shutdown);
            assert!(state.shutdown_timer > 0.0);
        }
    }
}
