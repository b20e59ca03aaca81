/// Spawn policy and terminal detection.
///
/// The RNG is injected rather than read from a process global, so runs
/// can be seeded (config `[game] seed`) and tests are deterministic.

use rand::Rng;

use super::grid::{self, COLS, ROWS};
use super::tile::Tile;

/// Probability a spawned tile is a 4 instead of a 2.
const FOUR_CHANCE: f64 = 0.1;

/// Place one new tile in a uniformly random empty cell.
/// Returns false when the board is full, a normal terminal
/// condition rather than an error.
pub fn spawn_tile<R: Rng>(tiles: &mut Vec<Tile>, rng: &mut R) -> bool {
    let empty = grid::empty_cells(tiles);
    if empty.is_empty() {
        return false;
    }
    let (row, col) = empty[rng.gen_range(0..empty.len())];
    let value = if rng.gen_bool(FOUR_CHANCE) { 4 } else { 2 };
    tiles.push(Tile::new(value, row, col));
    true
}

/// Any legal move left? True while an empty cell exists or two
/// orthogonal neighbors hold equal values. Each pair is checked once,
/// via its right and bottom neighbor.
pub fn can_move(tiles: &[Tile]) -> bool {
    if tiles.len() < ROWS * COLS {
        return true;
    }
    let mut vals = [[0u32; COLS]; ROWS];
    for t in tiles {
        vals[t.row][t.col] = t.value;
    }
    for r in 0..ROWS {
        for c in 0..COLS {
            if c + 1 < COLS && vals[r][c] == vals[r][c + 1] {
                return true;
            }
            if r + 1 < ROWS && vals[r][c] == vals[r + 1][c] {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    /// Full board with no equal neighbors anywhere.
    fn locked_board() -> Vec<Tile> {
        let rows = [[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]];
        let mut tiles = Vec::new();
        for (r, row) in rows.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                tiles.push(Tile::new(v, r, c));
            }
        }
        tiles
    }

    #[test]
    fn spawn_lands_in_the_only_gap() {
        let mut tiles = locked_board();
        tiles.retain(|t| (t.row, t.col) != (2, 1));
        let mut rng = SmallRng::seed_from_u64(42);

        assert!(spawn_tile(&mut tiles, &mut rng));
        assert_eq!(tiles.len(), ROWS * COLS);
        let spawned = tiles.last().unwrap();
        assert_eq!((spawned.row, spawned.col), (2, 1));
    }

    #[test]
    fn spawn_on_a_full_board_fails() {
        let mut tiles = locked_board();
        let mut rng = SmallRng::seed_from_u64(0);
        assert!(!spawn_tile(&mut tiles, &mut rng));
        assert_eq!(tiles.len(), ROWS * COLS);
    }

    #[test]
    fn spawned_values_are_two_or_four() {
        for seed in 0..32 {
            let mut tiles = Vec::new();
            let mut rng = SmallRng::seed_from_u64(seed);
            assert!(spawn_tile(&mut tiles, &mut rng));
            let t = &tiles[0];
            assert!(t.value == 2 || t.value == 4, "seed {seed}: {}", t.value);
            assert!(t.row < ROWS && t.col < COLS);
        }
    }

    #[test]
    fn seeded_spawns_are_reproducible() {
        let run = || {
            let mut tiles = Vec::new();
            let mut rng = SmallRng::seed_from_u64(7);
            for _ in 0..6 {
                spawn_tile(&mut tiles, &mut rng);
            }
            tiles
                .iter()
                .map(|t| (t.row, t.col, t.value))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn can_move_with_an_empty_cell() {
        let tiles = vec![Tile::new(2, 0, 0)];
        assert!(can_move(&tiles));
        assert!(can_move(&[]));
    }

    #[test]
    fn can_move_on_a_full_board_with_an_equal_pair() {
        let mut tiles = locked_board();
        // make (0,0)/(1,0) a vertical pair
        for t in tiles.iter_mut() {
            if (t.row, t.col) == (1, 0) {
                t.value = 2;
            }
        }
        assert!(can_move(&tiles));
    }

    #[test]
    fn locked_board_cannot_move() {
        assert!(!can_move(&locked_board()));
    }
}
