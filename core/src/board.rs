//! Grid of cells holding power-of-two tiles.
//!
//! The board is stored as a flat vector in row-major order (index
//! `row * size + col`). Row 0 is the top row. Every tile placed on the board
//! gets a fresh [`TileId`] so callers can follow a tile across moves.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by board queries and mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("coordinate ({row}, {col}) is outside a {size}x{size} board")]
    OutOfBounds { row: usize, col: usize, size: usize },
    #[error("tile value {0} is not a power of two >= 2")]
    InvalidTileValue(u32),
    #[error("row {row} has {len} cells, expected {size}")]
    Ragged { row: usize, len: usize, size: usize },
    #[error("a board needs at least one row")]
    NoRows,
}

/// A (row, col) position on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Coord { row, col }
    }

    /// Move one cell by `(d_row, d_col)`, or `None` if that leaves an
    /// `size`x`size` board.
    pub(crate) fn offset(self, (d_row, d_col): (isize, isize), size: usize) -> Option<Coord> {
        let row = self.row.checked_add_signed(d_row)?;
        let col = self.col.checked_add_signed(d_col)?;
        (row < size && col < size).then_some(Coord { row, col })
    }
}

impl From<(usize, usize)> for Coord {
    fn from((row, col): (usize, usize)) -> Self {
        Coord { row, col }
    }
}

/// Identity of a tile, unique within the board that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub u32);

/// A tile on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    id: TileId,
    value: u32,
}

impl Tile {
    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn value(&self) -> u32 {
        self.value
    }
}

/// Largest tile value. Two tiles of this value stay apart instead of
/// merging, since their sum does not fit in a `u32`.
pub const MAX_TILE_VALUE: u32 = 1 << 31;

/// Whether `value` may be stored on a board.
pub fn is_valid_value(value: u32) -> bool {
    value >= 2 && value.is_power_of_two()
}

/// Whether tiles of values `a` and `b` merge when they collide.
pub(crate) fn can_merge(a: u32, b: u32) -> bool {
    a == b && a < MAX_TILE_VALUE
}

/// An N x N grid of optional tiles.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Option<Tile>>,
    next_id: u32,
}

impl Board {
    /// Create an empty `size` x `size` board.
    ///
    /// # Panics
    ///
    /// Panics if `size` is 0. [`Board::from_rows`] and
    /// [`GameConfig::validate`](crate::GameConfig::validate) report that case
    /// as an error instead.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "board size must be positive");
        Board {
            size,
            cells: vec![None; size * size],
            next_id: 0,
        }
    }

    /// Build a board from rows of values, with 0 meaning an empty cell.
    ///
    /// The board is square with side `rows.len()`; each row must have that
    /// many cells.
    pub fn from_rows<R: AsRef<[u32]>>(rows: &[R]) -> Result<Self, BoardError> {
        let size = rows.len();
        if size == 0 {
            return Err(BoardError::NoRows);
        }
        let mut board = Board::new(size);
        for (row, cells) in rows.iter().enumerate() {
            let cells = cells.as_ref();
            if cells.len() != size {
                return Err(BoardError::Ragged {
                    row,
                    len: cells.len(),
                    size,
                });
            }
            for (col, &value) in cells.iter().enumerate() {
                if value != 0 {
                    board.set(Coord::new(row, col), Some(value))?;
                }
            }
        }
        Ok(board)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// The tile at `coord`, if any.
    pub fn get(&self, coord: Coord) -> Result<Option<Tile>, BoardError> {
        let idx = self.index(coord)?;
        Ok(self.cells[idx])
    }

    /// Place a fresh tile of `value` at `coord`, or clear it with `None`.
    ///
    /// Returns the id of the placed tile. On error the board is untouched.
    pub fn set(&mut self, coord: Coord, value: Option<u32>) -> Result<Option<TileId>, BoardError> {
        let idx = self.index(coord)?;
        match value {
            None => {
                self.cells[idx] = None;
                Ok(None)
            }
            Some(v) if !is_valid_value(v) => Err(BoardError::InvalidTileValue(v)),
            Some(v) => {
                let id = self.allocate_id();
                self.cells[idx] = Some(Tile { id, value: v });
                Ok(Some(id))
            }
        }
    }

    /// Number of cells holding a tile.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Occupied cells in row-major order. Each call starts a fresh scan.
    pub fn occupied(&self) -> impl Iterator<Item = (Coord, Tile)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(idx, cell)| cell.map(|tile| (self.coord_of(idx), tile)))
    }

    /// Empty cells in row-major order.
    pub fn empty_coords(&self) -> Vec<Coord> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(idx, _)| self.coord_of(idx))
            .collect()
    }

    /// Sum of all tile values.
    pub fn tile_sum(&self) -> u64 {
        self.occupied().map(|(_, t)| u64::from(t.value)).sum()
    }

    /// Largest tile value, or 0 on an empty board.
    pub fn max_value(&self) -> u32 {
        self.occupied().map(|(_, t)| t.value).max().unwrap_or(0)
    }

    /// Tile values row by row, 0 for empty cells.
    pub fn values(&self) -> Vec<Vec<u32>> {
        self.cells
            .chunks(self.size)
            .map(|row| row.iter().map(|c| c.map_or(0, |t| t.value)).collect())
            .collect()
    }

    // -------------------------------------------------------------------------
    // Crate-internal helpers used by the resolver
    // -------------------------------------------------------------------------

    /// A board of the same size that continues this board's id sequence.
    pub(crate) fn cleared(&self) -> Board {
        Board {
            size: self.size,
            cells: vec![None; self.cells.len()],
            next_id: self.next_id,
        }
    }

    /// Put an existing tile (keeping its identity) at `coord` with `value`.
    pub(crate) fn put(&mut self, coord: Coord, id: TileId, value: u32) {
        debug_assert!(is_valid_value(value));
        let idx = coord.row * self.size + coord.col;
        self.cells[idx] = Some(Tile { id, value });
    }

    pub(crate) fn cell(&self, coord: Coord) -> Option<Tile> {
        self.cells[coord.row * self.size + coord.col]
    }

    fn index(&self, coord: Coord) -> Result<usize, BoardError> {
        if coord.row >= self.size || coord.col >= self.size {
            return Err(BoardError::OutOfBounds {
                row: coord.row,
                col: coord.col,
                size: self.size,
            });
        }
        Ok(coord.row * self.size + coord.col)
    }

    fn coord_of(&self, idx: usize) -> Coord {
        Coord::new(idx / self.size, idx % self.size)
    }

    fn allocate_id(&mut self) -> TileId {
        let id = TileId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Board {{ size: {}, tiles: {} }}", self.size, self.occupied_count())?;
        for row in self.values() {
            for val in row {
                if val == 0 {
                    write!(f, "    .")?;
                } else {
                    write!(f, "{:5}", val)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let separator = format!("+{}", "------+".repeat(self.size));
        writeln!(f, "{}", separator)?;
        for row in self.values() {
            write!(f, "|")?;
            for val in row {
                if val == 0 {
                    write!(f, "      |")?;
                } else {
                    write!(f, "{:^6}|", val)?;
                }
            }
            writeln!(f)?;
            writeln!(f, "{}", separator)?;
        }
        Ok(())
    }
}
