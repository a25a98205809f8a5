//! Move resolution: where every tile ends up after a swipe.
//!
//! Tiles are resolved in row-major scan order. A tile walks along the swipe
//! direction until it leaves the board or bumps into another tile from the
//! pre-move snapshot. In the latter case the blocking tile is resolved first
//! (it may still be sliding), and the current tile either merges into the
//! tile resting at the blocker's final cell or stops right behind it.
//!
//! Results are memoized per origin cell for the duration of one call, so each
//! tile is walked once and recursion depth is bounded by the board side.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::board::{can_merge, Board, Coord, TileId};
use crate::Direction;

/// What happened to one tile during a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub tile_id: TileId,
    /// Cell the tile occupied before the move.
    pub origin: Coord,
    /// Cell the tile slid to. For a destroyed tile this is the cell of the
    /// tile it merged into.
    pub destination: Coord,
    /// Value after the move (doubled for the surviving side of a merge).
    pub final_value: u32,
    /// The tile merged into another one and no longer exists.
    pub destroyed: bool,
}

/// Result of resolving one swipe against a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The settled board. Equal to the input when `moved` is false.
    pub board: Board,
    /// Outcomes for tiles that moved, merged or were destroyed, ordered by
    /// origin in row-major order.
    pub outcomes: Vec<MoveOutcome>,
    /// At least one tile changed cell or merged.
    pub moved: bool,
}

impl Resolution {
    /// Number of merges performed by the move.
    pub fn merges(&self) -> usize {
        self.outcomes.iter().filter(|o| o.destroyed).count()
    }
}

#[derive(Debug, Clone, Copy)]
struct Settled {
    destination: Coord,
    value: u32,
    destroyed: bool,
    merged: bool,
}

/// Per-call resolution state. Indexed by flat cell index of the snapshot.
struct Resolver<'a> {
    board: &'a Board,
    step: (isize, isize),
    /// Resolution of the tile that started at each cell.
    settled: Vec<Option<Settled>>,
    /// Origin index of the surviving tile resting at each destination cell.
    resting: Vec<Option<usize>>,
}

impl<'a> Resolver<'a> {
    fn new(board: &'a Board, direction: Direction) -> Self {
        let cells = board.size() * board.size();
        Resolver {
            board,
            step: direction.delta(),
            settled: vec![None; cells],
            resting: vec![None; cells],
        }
    }

    fn index(&self, coord: Coord) -> usize {
        coord.row * self.board.size() + coord.col
    }

    /// Resolve the tile starting at `origin` and return the cell where the
    /// survivor it is associated with rests.
    fn settle(&mut self, origin: Coord) -> Coord {
        let origin_idx = self.index(origin);
        if let Some(done) = self.settled[origin_idx] {
            return done.destination;
        }
        let Some(tile) = self.board.cell(origin) else {
            unreachable!("settle called on empty cell {:?}", origin);
        };
        let size = self.board.size();

        let mut last = origin;
        let mut blocker = None;
        while let Some(next) = last.offset(self.step, size) {
            if self.board.cell(next).is_some() {
                blocker = Some(next);
                break;
            }
            last = next;
        }

        let outcome = match blocker {
            None => Settled {
                destination: last,
                value: tile.value(),
                destroyed: false,
                merged: false,
            },
            Some(blocker) => {
                let rest = self.settle(blocker);
                let rest_idx = self.index(rest);
                let survivor_idx = self.resting[rest_idx]
                    .expect("a resolved tile always leaves a survivor at its cell");
                let survivor = self.settled[survivor_idx]
                    .as_mut()
                    .expect("survivor is resolved before its cell is recorded");

                if !survivor.merged && can_merge(survivor.value, tile.value()) {
                    survivor.value *= 2;
                    survivor.merged = true;
                    Settled {
                        destination: rest,
                        value: tile.value(),
                        destroyed: true,
                        merged: false,
                    }
                } else {
                    let back = (-self.step.0, -self.step.1);
                    let destination = rest
                        .offset(back, size)
                        .expect("cell behind a resting tile is on the board");
                    Settled {
                        destination,
                        value: tile.value(),
                        destroyed: false,
                        merged: false,
                    }
                }
            }
        };

        if !outcome.destroyed {
            let dest_idx = self.index(outcome.destination);
            self.resting[dest_idx] = Some(origin_idx);
        }
        self.settled[origin_idx] = Some(outcome);
        outcome.destination
    }
}

/// Resolve a swipe in `direction` against `board`.
///
/// Pure: the input board is not modified and equal inputs give equal
/// resolutions. When nothing moves the returned board is an exact copy of
/// the input and no tile should be spawned.
pub fn resolve(board: &Board, direction: Direction) -> Resolution {
    let mut resolver = Resolver::new(board, direction);
    for (origin, _) in board.occupied() {
        resolver.settle(origin);
    }

    let mut outcomes = Vec::new();
    let mut next = board.cleared();
    let mut moved = false;
    for (origin, tile) in board.occupied() {
        let Some(settled) = resolver.settled[resolver.index(origin)] else {
            continue;
        };
        let relocated = settled.destination != origin;
        moved |= relocated || settled.merged;
        if relocated || settled.destroyed || settled.merged {
            outcomes.push(MoveOutcome {
                tile_id: tile.id(),
                origin,
                destination: settled.destination,
                final_value: settled.value,
                destroyed: settled.destroyed,
            });
        }
        if !settled.destroyed {
            next.put(settled.destination, tile.id(), settled.value);
        }
    }

    debug!(
        "resolved {:?}: {} outcomes, moved={}",
        direction,
        outcomes.len(),
        moved
    );

    if !moved {
        return Resolution {
            board: board.clone(),
            outcomes: Vec::new(),
            moved: false,
        };
    }
    Resolution {
        board: next,
        outcomes,
        moved,
    }
}

/// Which directions would change the board, as `[Up, Down, Left, Right]`.
pub fn legal_directions(board: &Board) -> [bool; 4] {
    Direction::all().map(|d| resolve(board, d).moved)
}
