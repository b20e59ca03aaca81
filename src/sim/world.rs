/// WorldState: the complete snapshot of a running game.
///
/// The tile arena owns the truth; the 4x4 cell array is derived from
/// it at the start of each move. `phase` is the move-cycle state
/// machine; directional input is only accepted in Idle, so a move
/// always starts from a settled, consistent board.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::config::SpeedConfig;
use crate::domain::spawn;
use crate::domain::tile::Tile;

/// Move-cycle state machine. One full move walks
/// Idle → Sliding → (Merging) → Settling → Idle, or ends in GameOver.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    /// Settled board, accepting directional input.
    Idle,
    /// Tiles animating toward their targets.
    Sliding,
    /// Slide finished, merge-pop counters draining.
    Merging,
    /// Resync logical cells, spawn one tile, check for game over.
    Settling,
    GameOver,
}

pub struct WorldState {
    pub tiles: Vec<Tile>,
    pub phase: Phase,
    pub speed: SpeedConfig,
    pub rng: SmallRng,

    // ── Meta ──
    pub anim_tick: u32,
    pub moves: u32,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
}

impl WorldState {
    pub fn new(speed: SpeedConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => SmallRng::seed_from_u64(s),
            None => SmallRng::from_entropy(),
        };
        WorldState {
            tiles: Vec::with_capacity(16),
            phase: Phase::Title,
            speed,
            rng,
            anim_tick: 0,
            moves: 0,
            message: String::new(),
            message_timer: 0,
        }
    }

    /// Fresh board: two starting tiles, straight to Idle.
    pub fn start_game(&mut self) {
        self.tiles.clear();
        spawn::spawn_tile(&mut self.tiles, &mut self.rng);
        spawn::spawn_tile(&mut self.tiles, &mut self.rng);
        self.moves = 0;
        self.anim_tick = 0;
        self.message.clear();
        self.message_timer = 0;
        self.phase = Phase::Idle;
    }

    /// Highest tile value on the board (0 when empty).
    pub fn highest_value(&self) -> u32 {
        self.tiles.iter().map(|t| t.value).max().unwrap_or(0)
    }

    /// Terminal signal the presentation layer polls.
    pub fn game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }
}
