//! # Tile Merge Core Engine
//!
//! Board transition engine for a sliding-tile merge puzzle: tiles carry
//! powers of two, a swipe slides every tile in one direction, equal tiles
//! that collide merge into one tile of double value (at most once per tile
//! per move), and a new tile of value 2 appears afterwards.
//!
//! The engine is split into three layers:
//!
//! - [`Board`]: the N x N grid with bounds and value checks.
//! - [`resolve`]: pure move resolution producing the settled board plus a
//!   [`MoveOutcome`] per affected tile, for an animation layer to replay.
//! - [`spawn`] and [`is_terminal`]: run after the move has been presented.
//!
//! [`Game`] ties them together with a seeded RNG and the two-phase
//! swipe/settle protocol.
//!
//! ## Example
//!
//! ```rust
//! use tile_merge_core::{Direction, Game, GameConfig};
//!
//! let mut game = Game::new(GameConfig::default(), 42).unwrap();
//! let swipe = game.swipe(Direction::Left).unwrap();
//! if swipe.moved {
//!     // animate swipe.outcomes, then:
//!     let settle = game.settle().unwrap();
//!     println!("spawned {:?}, over: {}", settle.spawned, settle.terminal);
//! }
//! ```

use log::info;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod board;
pub mod resolve;
pub mod spawn;

pub use board::{Board, BoardError, Coord, Tile, TileId, MAX_TILE_VALUE};
pub use resolve::{legal_directions, resolve, MoveOutcome, Resolution};
pub use spawn::{is_terminal, spawn, SPAWN_VALUE};

/// The four swipe directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Direction {
    /// Decode the wire byte used by the bindings: 0=Up, 1=Down, 2=Left,
    /// 3=Right. Any other byte is `None`.
    pub fn from_u8(value: u8) -> Option<Direction> {
        match value {
            0 => Some(Direction::Up),
            1 => Some(Direction::Down),
            2 => Some(Direction::Left),
            3 => Some(Direction::Right),
            _ => None,
        }
    }

    /// Every direction, in wire-byte order.
    pub fn all() -> [Direction; 4] {
        [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ]
    }

    /// Unit step as `(d_row, d_col)`. Row 0 is the top of the board.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Board and spawning parameters for a [`Game`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Side length of the square board.
    pub size: usize,
    /// Tiles spawned on a fresh board.
    pub initial_tiles: usize,
    /// Tiles spawned after every move that changed the board.
    pub spawn_per_move: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            size: 4,
            initial_tiles: 2,
            spawn_per_move: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("board size must be at least 1")]
    ZeroSize,
    #[error("{initial} initial tiles do not fit on a board of {cells} cells")]
    TooManyInitialTiles { initial: usize, cells: usize },
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::ZeroSize);
        }
        let cells = self.size * self.size;
        if self.initial_tiles > cells {
            return Err(ConfigError::TooManyInitialTiles {
                initial: self.initial_tiles,
                cells,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Game
// =============================================================================

/// Protocol errors from [`Game`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("previous move has not been settled yet")]
    MoveInProgress,
    #[error("no move is waiting to be settled")]
    NothingToSettle,
    #[error("game is over")]
    GameOver,
}

/// Result of [`Game::swipe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Swipe {
    /// Per-tile outcomes to animate, ordered by origin.
    pub outcomes: Vec<MoveOutcome>,
    /// Whether the board changed. When false there is nothing to settle.
    pub moved: bool,
}

/// Result of [`Game::settle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settle {
    /// Cells that received a new tile.
    pub spawned: Vec<Coord>,
    /// No further move is possible.
    pub terminal: bool,
}

/// Result of executing a full step (swipe and settle) in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    /// Whether the board changed (and new tiles were spawned).
    pub changed: bool,
    /// Number of merges in this move.
    pub merges: usize,
    /// Whether the game is over.
    pub done: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Ready,
    Settling,
    Over,
}

/// A running game: board, seeded RNG and the swipe/settle lock.
#[derive(Clone)]
pub struct Game {
    config: GameConfig,
    board: Board,
    rng: SmallRng,
    phase: Phase,
    moves: u32,
}

impl Game {
    /// Create a new game with the given config and seed.
    ///
    /// The board starts with `config.initial_tiles` tiles of value 2.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut game = Game {
            config,
            board: Board::new(config.size),
            rng: SmallRng::seed_from_u64(seed),
            phase: Phase::Ready,
            moves: 0,
        };
        game.start();
        Ok(game)
    }

    /// Reset the game to its initial state with a new seed.
    pub fn reset(&mut self, seed: u64) {
        self.board = Board::new(self.config.size);
        self.rng = SmallRng::seed_from_u64(seed);
        self.phase = Phase::Ready;
        self.moves = 0;
        self.start();
    }

    /// Apply a swipe. The board is updated to its settled state right away;
    /// if it moved, the game stays locked until [`Game::settle`] is called.
    pub fn swipe(&mut self, direction: Direction) -> Result<Swipe, GameError> {
        match self.phase {
            Phase::Settling => return Err(GameError::MoveInProgress),
            Phase::Over => return Err(GameError::GameOver),
            Phase::Ready => {}
        }

        let resolution = resolve(&self.board, direction);
        if resolution.moved {
            self.board = resolution.board;
            self.phase = Phase::Settling;
            self.moves += 1;
        }
        Ok(Swipe {
            outcomes: resolution.outcomes,
            moved: resolution.moved,
        })
    }

    /// Finish a move once its presentation is done: spawn new tiles and
    /// check for game over.
    pub fn settle(&mut self) -> Result<Settle, GameError> {
        if self.phase != Phase::Settling {
            return Err(GameError::NothingToSettle);
        }
        let spawned = spawn(&mut self.board, self.config.spawn_per_move, &mut self.rng);
        let terminal = self.update_phase();
        Ok(Settle { spawned, terminal })
    }

    /// Swipe and settle in one call.
    ///
    /// If the move doesn't change the board, no tile is spawned. Calling
    /// this on a finished game, or while a swipe is unsettled, reports
    /// `changed: false`.
    pub fn step(&mut self, direction: Direction) -> StepResult {
        let swipe = match self.swipe(direction) {
            Ok(swipe) => swipe,
            Err(_) => {
                return StepResult {
                    changed: false,
                    merges: 0,
                    done: self.is_over(),
                }
            }
        };
        let merges = swipe.outcomes.iter().filter(|o| o.destroyed).count();
        if swipe.moved {
            // The swipe just locked the game, so settling cannot fail.
            let _ = self.settle();
        }
        StepResult {
            changed: swipe.moved,
            merges,
            done: self.is_over(),
        }
    }

    /// Check if the game is over (no move can change the board).
    pub fn is_over(&self) -> bool {
        self.phase == Phase::Over
    }

    /// A swipe moved the board and is waiting for [`Game::settle`].
    pub fn is_settling(&self) -> bool {
        self.phase == Phase::Settling
    }

    /// Legal directions as a boolean array [Up, Down, Left, Right].
    pub fn legal_directions(&self) -> [bool; 4] {
        legal_directions(&self.board)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Number of moves that changed the board.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Get the maximum tile value on the board.
    pub fn max_tile(&self) -> u32 {
        self.board.max_value()
    }

    /// Get the number of empty cells on the board.
    pub fn empty_count(&self) -> usize {
        self.board.size() * self.board.size() - self.board.occupied_count()
    }

    // -------------------------------------------------------------------------
    // Private methods
    // -------------------------------------------------------------------------

    fn start(&mut self) {
        spawn(&mut self.board, self.config.initial_tiles, &mut self.rng);
        self.update_phase();
    }

    fn update_phase(&mut self) -> bool {
        let terminal = is_terminal(&self.board);
        if terminal {
            info!(
                "game over after {} moves, max tile {}",
                self.moves,
                self.board.max_value()
            );
            self.phase = Phase::Over;
        } else {
            self.phase = Phase::Ready;
        }
        terminal
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Game {{ moves: {}, phase: {:?} }}",
            self.moves, self.phase
        )?;
        write!(f, "{:?}", self.board)
    }
}

impl std::fmt::Display for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Moves: {}", self.moves)?;
        write!(f, "{}", self.board)
    }
}

// =============================================================================
// Tests
// =============================================================================
