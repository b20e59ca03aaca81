/// Transition engine: the slide/merge pass for one move.
///
/// Mutates tile values, animation targets, and merge/removal flags in
/// place, then purges absorbed tiles. The cell array lives only for
/// the duration of the pass; logical row/col stay untouched until the
/// animation clock settles the move, so a pass always reads the board
/// the previous move left behind.

use super::grid::{self, Direction, COLS, ROWS};
use super::tile::Tile;

/// Slide every tile as far as the direction allows, merging equal
/// pairs along the way.
///
/// Merge policy: a tile merges at most once per move. The surviving
/// tile doubles in place, starts its pop animation, and blocks any
/// further merge against it this pass; the absorbed tile is flagged
/// and purged before returning. Every visited tile gets its animation
/// target set, even when it did not move. Returns true iff any tile
/// changed cell or any merge happened.
pub fn apply_move(tiles: &mut Vec<Tile>, dir: Direction, pop_ticks: u32) -> bool {
    for t in tiles.iter_mut() {
        t.merged_this_move = false;
        t.pending_removal = false;
    }

    let mut cells = grid::build(tiles);
    let (dr, dc) = dir.delta();
    let mut moved = false;

    for (r, c) in dir.traversal() {
        let idx = match cells[r][c] {
            Some(i) => i,
            None => continue,
        };
        let (mut cur_r, mut cur_c) = (r, c);

        loop {
            let nr = cur_r as i32 + dr;
            let nc = cur_c as i32 + dc;
            if nr < 0 || nr >= ROWS as i32 || nc < 0 || nc >= COLS as i32 {
                break;
            }
            let (nr, nc) = (nr as usize, nc as usize);

            match cells[nr][nc] {
                None => {
                    cells[nr][nc] = Some(idx);
                    cells[cur_r][cur_c] = None;
                    cur_r = nr;
                    cur_c = nc;
                    moved = true;
                }
                Some(ahead) => {
                    if tiles[ahead].value == tiles[idx].value
                        && !tiles[idx].merged_this_move
                        && !tiles[ahead].merged_this_move
                    {
                        tiles[ahead].value *= 2;
                        tiles[ahead].merged_this_move = true;
                        tiles[ahead].start_merge_pop(pop_ticks);
                        tiles[idx].pending_removal = true;
                        cells[cur_r][cur_c] = None;
                        moved = true;
                    }
                    break;
                }
            }
        }

        tiles[idx].set_target_cell(cur_r, cur_c);
    }

    tiles.retain(|t| !t.pending_removal);
    moved
}

#[cfg(test)]
mod tests {
    use super::*;

    const POP: u32 = 8;

    /// Helper: build a tile arena from a string diagram.
    /// Legend:  '2'=2  '4'=4  '8'=8  'a'=16  'b'=32  '.'=empty
    fn board_from(rows: &[&str]) -> Vec<Tile> {
        let mut tiles = Vec::new();
        for (r, row) in rows.iter().enumerate() {
            for (c, ch) in row.chars().enumerate() {
                let value = match ch {
                    '2' => 2,
                    '4' => 4,
                    '8' => 8,
                    'a' => 16,
                    'b' => 32,
                    _ => continue,
                };
                tiles.push(Tile::new(value, r, c));
            }
        }
        tiles
    }

    /// Values by the cell each tile is headed to (0 = empty).
    /// Panics if two tiles share a destination.
    fn settled(tiles: &[Tile]) -> [[u32; COLS]; ROWS] {
        let mut vals = [[0u32; COLS]; ROWS];
        for t in tiles {
            let (r, c) = t.target_cell();
            assert_eq!(vals[r][c], 0, "two tiles headed to ({r}, {c})");
            vals[r][c] = t.value;
        }
        vals
    }

    fn value_sum(tiles: &[Tile]) -> u32 {
        tiles.iter().map(|t| t.value).sum()
    }

    #[test]
    fn adjacent_pair_merges_left() {
        let mut tiles = board_from(&["22.."]);
        assert!(apply_move(&mut tiles, Direction::Left, POP));
        assert_eq!(settled(&tiles)[0], [4, 0, 0, 0]);
        assert_eq!(tiles.len(), 1);
    }

    #[test]
    fn gap_does_not_block_a_merge() {
        let mut tiles = board_from(&["2.2."]);
        assert!(apply_move(&mut tiles, Direction::Left, POP));
        assert_eq!(settled(&tiles)[0], [4, 0, 0, 0]);
    }

    #[test]
    fn different_value_blocks_and_move_is_a_noop() {
        let mut tiles = board_from(&["242."]);
        assert!(!apply_move(&mut tiles, Direction::Left, POP));
        assert_eq!(settled(&tiles)[0], [2, 4, 2, 0]);
        // targets must equal current positions on a no-op move
        for t in &tiles {
            assert_eq!(t.x, t.target_x);
            assert_eq!(t.y, t.target_y);
        }
    }

    #[test]
    fn four_equal_tiles_make_two_pairs() {
        let mut tiles = board_from(&["2222"]);
        assert!(apply_move(&mut tiles, Direction::Left, POP));
        assert_eq!(settled(&tiles)[0], [4, 4, 0, 0]);
    }

    #[test]
    fn triple_merges_the_pair_farthest_along() {
        let mut tiles = board_from(&["222."]);
        assert!(apply_move(&mut tiles, Direction::Left, POP));
        assert_eq!(settled(&tiles)[0], [4, 2, 0, 0]);
    }

    #[test]
    fn merge_result_does_not_chain() {
        // 2 2 4: the two 2s become a 4, which must NOT absorb the
        // incoming 4 in the same pass.
        let mut tiles = board_from(&["224."]);
        assert!(apply_move(&mut tiles, Direction::Left, POP));
        assert_eq!(settled(&tiles)[0], [4, 4, 0, 0]);
        assert_eq!(tiles.len(), 2);
    }

    #[test]
    fn slides_right() {
        let mut tiles = board_from(&["22.."]);
        assert!(apply_move(&mut tiles, Direction::Right, POP));
        assert_eq!(settled(&tiles)[0], [0, 0, 0, 4]);
    }

    #[test]
    fn slides_down_a_column() {
        let mut tiles = board_from(&["2...", "2...", "....", "8..."]);
        assert!(apply_move(&mut tiles, Direction::Down, POP));
        let vals = settled(&tiles);
        assert_eq!(vals[3][0], 8);
        assert_eq!(vals[2][0], 4);
        assert_eq!(vals[1][0], 0);
    }

    #[test]
    fn slides_up_a_column() {
        let mut tiles = board_from(&["....", "4...", "....", "4..."]);
        assert!(apply_move(&mut tiles, Direction::Up, POP));
        assert_eq!(settled(&tiles)[0][0], 8);
        assert_eq!(tiles.len(), 1);
    }

    #[test]
    fn survivor_pops_and_absorbed_tile_is_purged() {
        let mut tiles = board_from(&["22.."]);
        apply_move(&mut tiles, Direction::Left, POP);
        assert_eq!(tiles.len(), 1);
        assert!(tiles[0].merged_this_move);
        assert_eq!(tiles[0].pop_remaining, POP);
        assert!(!tiles[0].pending_removal);
    }

    #[test]
    fn merge_flags_reset_on_the_next_move() {
        let mut tiles = board_from(&["22.."]);
        apply_move(&mut tiles, Direction::Left, POP);
        assert!(tiles[0].merged_this_move);

        assert!(apply_move(&mut tiles, Direction::Right, POP));
        assert!(!tiles[0].merged_this_move);
        assert_eq!(settled(&tiles)[0], [0, 0, 0, 4]);
    }

    #[test]
    fn value_mass_is_conserved() {
        let boards: &[&[&str]] = &[
            &["2222", "4444", "2222", "4444"],
            &["2.2.", ".4.4", "88..", "...a"],
            &["24..", "42..", "..b8", "2..2"],
        ];
        for rows in boards {
            for dir in [
                Direction::Left,
                Direction::Right,
                Direction::Up,
                Direction::Down,
            ] {
                let mut tiles = board_from(rows);
                let before = value_sum(&tiles);
                apply_move(&mut tiles, dir, POP);
                assert_eq!(value_sum(&tiles), before, "{rows:?} {dir:?}");
                // settled() also asserts no two tiles share a cell
                settled(&tiles);
            }
        }
    }

    #[test]
    fn full_static_board_never_moves() {
        let rows = &["2424", "4242", "2424", "4242"];
        for dir in [
            Direction::Left,
            Direction::Right,
            Direction::Up,
            Direction::Down,
        ] {
            let mut tiles = board_from(rows);
            assert!(!apply_move(&mut tiles, dir, POP), "{dir:?}");
            assert_eq!(tiles.len(), 16);
        }
    }

    #[test]
    fn rows_slide_independently() {
        let mut tiles = board_from(&["2.2.", ".44.", "8...", "...8"]);
        assert!(apply_move(&mut tiles, Direction::Left, POP));
        let vals = settled(&tiles);
        assert_eq!(vals[0], [4, 0, 0, 0]);
        assert_eq!(vals[1], [8, 0, 0, 0]);
        assert_eq!(vals[2], [8, 0, 0, 0]);
        assert_eq!(vals[3], [8, 0, 0, 0]);
    }
}
