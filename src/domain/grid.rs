/// Grid model: the 4x4 board as a derived view over the tile arena.
///
/// The tile collection owns the truth. The cell array is rebuilt from
/// tile (row, col) at the start of each move and holds arena indices,
/// never tile references, so the slide pass mutates tiles through
/// indices without aliasing. `Direction` carries the traversal
/// vocabulary: the per-step offset and the visit order.

use std::collections::HashSet;

use super::tile::Tile;

pub const ROWS: usize = 4;
pub const COLS: usize = 4;

/// Slide direction for one move.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Per-step offset (d_row, d_col) a sliding tile moves by.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
        }
    }

    /// Visit order over all cells for the slide pass.
    ///
    /// Cells farther along the move direction come first, so each tile
    /// is pushed as far as possible before the tiles behind it are
    /// considered. Any other order stacks and merges incorrectly.
    pub fn traversal(self) -> Vec<(usize, usize)> {
        let mut order = Vec::with_capacity(ROWS * COLS);
        match self {
            Direction::Left => {
                for r in 0..ROWS {
                    for c in 0..COLS {
                        order.push((r, c));
                    }
                }
            }
            Direction::Right => {
                for r in 0..ROWS {
                    for c in (0..COLS).rev() {
                        order.push((r, c));
                    }
                }
            }
            Direction::Up => {
                for c in 0..COLS {
                    for r in 0..ROWS {
                        order.push((r, c));
                    }
                }
            }
            Direction::Down => {
                for c in 0..COLS {
                    for r in (0..ROWS).rev() {
                        order.push((r, c));
                    }
                }
            }
        }
        order
    }
}

/// Cell array holding arena indices into the tile vec.
pub type CellGrid = [[Option<usize>; COLS]; ROWS];

/// Build the cell array from current tile logical positions.
pub fn build(tiles: &[Tile]) -> CellGrid {
    let mut cells: CellGrid = [[None; COLS]; ROWS];
    for (i, t) in tiles.iter().enumerate() {
        debug_assert!(
            cells[t.row][t.col].is_none(),
            "two tiles at ({}, {})",
            t.row,
            t.col
        );
        cells[t.row][t.col] = Some(i);
    }
    cells
}

/// Set of cells currently holding a tile.
pub fn occupied_cells(tiles: &[Tile]) -> HashSet<(usize, usize)> {
    tiles.iter().map(|t| (t.row, t.col)).collect()
}

/// Cells with no tile, in row-major order.
pub fn empty_cells(tiles: &[Tile]) -> Vec<(usize, usize)> {
    let occupied = occupied_cells(tiles);
    let mut empty = Vec::with_capacity(ROWS * COLS - occupied.len());
    for r in 0..ROWS {
        for c in 0..COLS {
            if !occupied.contains(&(r, c)) {
                empty.push((r, c));
            }
        }
    }
    empty
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_places_arena_indices() {
        let tiles = vec![Tile::new(2, 0, 0), Tile::new(4, 3, 1), Tile::new(8, 1, 3)];
        let cells = build(&tiles);
        assert_eq!(cells[0][0], Some(0));
        assert_eq!(cells[3][1], Some(1));
        assert_eq!(cells[1][3], Some(2));
        assert_eq!(cells[2][2], None);
    }

    #[test]
    fn empty_cells_is_grid_minus_occupied() {
        let tiles = vec![Tile::new(2, 0, 0), Tile::new(2, 2, 3)];
        let empty = empty_cells(&tiles);
        assert_eq!(empty.len(), ROWS * COLS - 2);
        assert!(!empty.contains(&(0, 0)));
        assert!(!empty.contains(&(2, 3)));
        assert!(empty.contains(&(1, 1)));
    }

    #[test]
    fn empty_board_has_all_cells_free() {
        assert_eq!(empty_cells(&[]).len(), ROWS * COLS);
        assert!(occupied_cells(&[]).is_empty());
    }

    #[test]
    fn traversal_visits_far_cells_first() {
        // Moving left: leftmost column first, so tiles near the left
        // edge settle before the ones behind them are pushed.
        let left = Direction::Left.traversal();
        assert_eq!(left[0], (0, 0));
        assert_eq!(left[1], (0, 1));

        let right = Direction::Right.traversal();
        assert_eq!(right[0], (0, COLS - 1));

        let up = Direction::Up.traversal();
        assert_eq!(up[0], (0, 0));
        assert_eq!(up[1], (1, 0));

        let down = Direction::Down.traversal();
        assert_eq!(down[0], (ROWS - 1, 0));
    }

    #[test]
    fn traversal_covers_every_cell_once() {
        for dir in [
            Direction::Left,
            Direction::Right,
            Direction::Up,
            Direction::Down,
        ] {
            let order = dir.traversal();
            assert_eq!(order.len(), ROWS * COLS);
            let unique: HashSet<_> = order.iter().collect();
            assert_eq!(unique.len(), ROWS * COLS);
        }
    }
}
