//! # Tile Merge WebAssembly Bindings
//!
//! JavaScript-friendly bindings to the tile merge engine using wasm-bindgen.
//! The browser side owns rendering and animation; it drives the engine with
//! the two-phase protocol:
//!
//! 1. `swipe(direction)` returns the per-tile outcomes to animate.
//! 2. once the animation finishes, `settle()` spawns the next tile and
//!    reports whether the game is over.

use serde::Serialize;
use tile_merge_core::{Direction, Game, GameConfig, MoveOutcome};
use wasm_bindgen::prelude::*;

/// Result of a swipe, serialized for JavaScript.
#[derive(Serialize)]
pub struct JsSwipe {
    /// Settled board, row-major, 0 for empty cells.
    pub board: Vec<u32>,
    /// Tiles to animate.
    pub outcomes: Vec<MoveOutcome>,
    /// Whether the board changed. When false, do not call `settle`.
    pub moved: bool,
    /// Why the swipe was rejected, if it was.
    pub rejected: Option<String>,
}

/// Result of settling a move, serialized for JavaScript.
#[derive(Serialize)]
pub struct JsSettle {
    pub board: Vec<u32>,
    /// `[row, col]` pairs of the spawned tiles.
    pub spawned: Vec<[usize; 2]>,
    /// Whether the game is over.
    pub terminal: bool,
}

/// WebAssembly wrapper for a game.
#[wasm_bindgen]
pub struct WasmGame {
    game: Game,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a new game on a `size` x `size` board with the given seed.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64, size: usize) -> Result<WasmGame, JsError> {
        let config = GameConfig {
            size,
            ..GameConfig::default()
        };
        let game = Game::new(config, seed)?;
        Ok(WasmGame { game })
    }

    /// Reset the game to initial state with a new seed.
    pub fn reset(&mut self, seed: u64) {
        self.game.reset(seed);
    }

    /// Swipe in a direction (0 = Up, 1 = Down, 2 = Left, 3 = Right).
    ///
    /// Input arriving while the previous move is still being animated is
    /// rejected and leaves the game untouched.
    pub fn swipe(&mut self, direction: u8) -> JsValue {
        let result = match Direction::from_u8(direction) {
            Some(dir) => self.game.swipe(dir).map_err(|e| e.to_string()),
            None => Err(format!("invalid direction {direction}")),
        };
        let js = match result {
            Ok(swipe) => JsSwipe {
                board: self.flat_board(),
                outcomes: swipe.outcomes,
                moved: swipe.moved,
                rejected: None,
            },
            Err(reason) => JsSwipe {
                board: self.flat_board(),
                outcomes: Vec::new(),
                moved: false,
                rejected: Some(reason),
            },
        };
        serde_wasm_bindgen::to_value(&js).unwrap_or(JsValue::NULL)
    }

    /// Spawn the next tile after the swipe animation has completed.
    pub fn settle(&mut self) -> Result<JsValue, JsError> {
        let settle = self.game.settle()?;
        let js = JsSettle {
            board: self.flat_board(),
            spawned: settle.spawned.iter().map(|c| [c.row, c.col]).collect(),
            terminal: settle.terminal,
        };
        Ok(serde_wasm_bindgen::to_value(&js).unwrap_or(JsValue::NULL))
    }

    /// Get the current board, row-major, 0 for empty cells.
    #[wasm_bindgen(js_name = getBoard)]
    pub fn get_board(&self) -> Vec<u32> {
        self.flat_board()
    }

    /// Side length of the board.
    #[wasm_bindgen(js_name = getSize)]
    pub fn get_size(&self) -> usize {
        self.game.board().size()
    }

    /// Check if the game is over.
    #[wasm_bindgen(js_name = isOver)]
    pub fn is_over(&self) -> bool {
        self.game.is_over()
    }

    /// Get legal directions as an array of 4 flags [Up, Down, Left, Right].
    #[wasm_bindgen(js_name = getLegalDirections)]
    pub fn get_legal_directions(&self) -> Vec<u8> {
        self.game
            .legal_directions()
            .iter()
            .map(|&b| if b { 1 } else { 0 })
            .collect()
    }
}

impl WasmGame {
    fn flat_board(&self) -> Vec<u32> {
        self.game.board().values().concat()
    }
}
