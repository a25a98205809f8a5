//! Tile spawning and game-over detection.

use log::trace;
use rand::Rng;

use crate::board::{can_merge, Board, Coord};

/// Value of every spawned tile.
pub const SPAWN_VALUE: u32 = 2;

/// Place up to `count` tiles of value 2 on distinct empty cells chosen
/// uniformly at random. Returns the cells that were filled.
///
/// A full board is left alone. If fewer than `count` cells are empty, all
/// of them are filled.
pub fn spawn<R: Rng>(board: &mut Board, count: usize, rng: &mut R) -> Vec<Coord> {
    let mut empty = board.empty_coords();
    let mut placed = Vec::with_capacity(count.min(empty.len()));

    while placed.len() < count && !empty.is_empty() {
        let coord = empty.remove(rng.gen_range(0..empty.len()));
        board
            .set(coord, Some(SPAWN_VALUE))
            .expect("empty coordinate of this board accepts a spawn value");
        trace!("spawned {} at ({}, {})", SPAWN_VALUE, coord.row, coord.col);
        placed.push(coord);
    }
    placed
}

/// Whether no move can change the board: every cell is occupied and no two
/// orthogonal neighbours hold the same value.
///
/// Scans row-major and stops at the first empty cell or equal pair.
pub fn is_terminal(board: &Board) -> bool {
    const NEIGHBOURS: [(isize, isize); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];
    let size = board.size();

    for row in 0..size {
        for col in 0..size {
            let here = Coord::new(row, col);
            let Some(tile) = board.cell(here) else {
                return false;
            };
            for delta in NEIGHBOURS {
                let Some(next) = here.offset(delta, size) else {
                    continue;
                };
                if board.cell(next).is_some_and(|n| can_merge(n.value(), tile.value())) {
                    return false;
                }
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_spawn_places_twos_on_empty_cells() {
        let mut board = Board::from_rows(&[[4, 0, 0], [0, 8, 0], [0, 0, 0]]).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        let placed = spawn(&mut board, 3, &mut rng);

        assert_eq!(placed.len(), 3);
        assert_eq!(board.occupied_count(), 5);
        for coord in &placed {
            assert_eq!(board.get(*coord).unwrap().unwrap().value(), 2);
        }
        // Existing tiles untouched.
        assert_eq!(board.get(Coord::new(0, 0)).unwrap().unwrap().value(), 4);
        assert_eq!(board.get(Coord::new(1, 1)).unwrap().unwrap().value(), 8);
    }

    #[test]
    fn test_spawn_distinct_cells() {
        let mut board = Board::new(4);
        let mut rng = SmallRng::seed_from_u64(5);
        let mut placed = spawn(&mut board, 10, &mut rng);
        placed.sort();
        placed.dedup();
        assert_eq!(placed.len(), 10);
    }

    #[test]
    fn test_spawn_stops_when_full() {
        let mut board = Board::from_rows(&[[2, 4], [8, 0]]).unwrap();
        let mut rng = SmallRng::seed_from_u64(3);
        let placed = spawn(&mut board, 5, &mut rng);
        assert_eq!(placed, vec![Coord::new(1, 1)]);
        assert!(board.is_full());
    }

    #[test]
    fn test_spawn_on_full_board_is_noop() {
        let mut board = Board::from_rows(&[[2, 4], [8, 16]]).unwrap();
        let before = board.clone();
        let mut rng = SmallRng::seed_from_u64(3);
        assert!(spawn(&mut board, 1, &mut rng).is_empty());
        assert_eq!(board, before);
    }

    #[test]
    fn test_spawn_determinism() {
        let mut a = Board::new(4);
        let mut b = Board::new(4);
        let placed_a = spawn(&mut a, 4, &mut SmallRng::seed_from_u64(12345));
        let placed_b = spawn(&mut b, 4, &mut SmallRng::seed_from_u64(12345));
        assert_eq!(placed_a, placed_b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_spawn_covers_every_cell_eventually() {
        let mut rng = SmallRng::seed_from_u64(77);
        let mut seen = [false; 9];
        for _ in 0..500 {
            let mut board = Board::new(3);
            for coord in spawn(&mut board, 1, &mut rng) {
                seen[coord.row * 3 + coord.col] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_terminal_checkerboard() {
        let board = Board::from_rows(&[
            [2, 4, 2, 4],
            [4, 2, 4, 2],
            [2, 4, 2, 4],
            [4, 2, 4, 2],
        ])
        .unwrap();
        assert!(is_terminal(&board));
    }

    #[test]
    fn test_not_terminal_with_empty_cell() {
        let board = Board::from_rows(&[
            [2, 4, 2, 4],
            [4, 2, 4, 2],
            [2, 4, 2, 4],
            [4, 2, 4, 0],
        ])
        .unwrap();
        assert!(!is_terminal(&board));
        assert!(!is_terminal(&Board::new(4)));
    }

    #[test]
    fn test_not_terminal_horizontal_pair() {
        let board = Board::from_rows(&[
            [2, 2, 4, 8],
            [4, 8, 16, 32],
            [8, 16, 32, 64],
            [16, 32, 64, 128],
        ])
        .unwrap();
        assert!(!is_terminal(&board));
    }

    #[test]
    fn test_not_terminal_vertical_pair() {
        let board = Board::from_rows(&[
            [2, 4, 8, 16],
            [2, 8, 16, 32],
            [4, 16, 32, 64],
            [8, 32, 64, 128],
        ])
        .unwrap();
        assert!(!is_terminal(&board));
    }

    #[test]
    fn test_not_terminal_pair_in_last_row() {
        let board = Board::from_rows(&[[2, 4, 8], [4, 8, 2], [8, 16, 16]]).unwrap();
        assert!(!is_terminal(&board));
    }

    #[test]
    fn test_terminal_with_equal_largest_tiles() {
        let top = crate::board::MAX_TILE_VALUE;
        let board = Board::from_rows(&[[top, top], [2, 4]]).unwrap();
        assert!(is_terminal(&board));
    }

    #[test]
    fn test_single_cell_board() {
        assert!(is_terminal(&Board::from_rows(&[[2]]).unwrap()));
        assert!(!is_terminal(&Board::new(1)));
    }
}
