/// The tick function: advances the move cycle by one frame.
///
/// Phase transitions per move:
///   Idle  --input, board changed-->  Sliding
///   Sliding  --every tile arrived-->  Merging (pops pending) | Settling
///   Merging  --all counters drained-->  Settling
///   Settling  --resync, spawn, terminal check-->  Idle | GameOver
///
/// Input is consumed only in Idle; a direction that changes nothing
/// leaves the phase alone. Logical row/col are resynced exclusively in
/// Settling, so the transition engine always reads a consistent grid.

use crate::domain::grid::Direction;
use crate::domain::{shift, spawn};

use super::event::GameEvent;
use super::world::{Phase, WorldState};

pub fn step(world: &mut WorldState, input: Option<Direction>) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    world.anim_tick = world.anim_tick.wrapping_add(1);

    if world.message_timer > 0 {
        world.message_timer -= 1;
        if world.message_timer == 0 {
            world.message.clear();
        }
    }

    match world.phase {
        Phase::Idle => resolve_input(world, input, &mut events),
        Phase::Sliding => resolve_slide(world),
        Phase::Merging => resolve_merge_pops(world),
        Phase::Settling => resolve_settle(world, &mut events),
        Phase::Title | Phase::GameOver => {}
    }

    events
}

fn resolve_input(world: &mut WorldState, input: Option<Direction>, events: &mut Vec<GameEvent>) {
    let dir = match input {
        Some(d) => d,
        None => return,
    };

    if !shift::apply_move(&mut world.tiles, dir, world.speed.merge_pop_ticks) {
        return; // nothing budged, stay Idle
    }

    world.moves += 1;
    events.push(GameEvent::MoveApplied { dir });
    for t in &world.tiles {
        if t.merged_this_move {
            let (row, col) = t.target_cell();
            events.push(GameEvent::TilesMerged {
                row,
                col,
                value: t.value,
            });
        }
    }
    world.phase = Phase::Sliding;
}

fn resolve_slide(world: &mut WorldState) {
    let step_px = world.speed.slide_step_px;
    let mut any_moving = false;
    for t in world.tiles.iter_mut() {
        if t.advance_toward_target(step_px) {
            any_moving = true;
        }
    }
    if any_moving {
        return;
    }
    world.phase = if world.tiles.iter().any(|t| t.pop_remaining > 0) {
        Phase::Merging
    } else {
        Phase::Settling
    };
}

fn resolve_merge_pops(world: &mut WorldState) {
    for t in world.tiles.iter_mut() {
        if t.pop_remaining > 0 {
            t.pop_remaining -= 1;
        }
    }
    if world.tiles.iter().all(|t| t.pop_remaining == 0) {
        world.phase = Phase::Settling;
    }
}

fn resolve_settle(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    for t in world.tiles.iter_mut() {
        t.resync_cell();
    }

    if spawn::spawn_tile(&mut world.tiles, &mut world.rng) {
        if let Some(t) = world.tiles.last() {
            events.push(GameEvent::TileSpawned {
                row: t.row,
                col: t.col,
                value: t.value,
            });
        }
    }

    if spawn::can_move(&world.tiles) {
        world.phase = Phase::Idle;
    } else {
        world.phase = Phase::GameOver;
        world.set_message("No moves left", 0);
        events.push(GameEvent::BoardLocked);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpeedConfig;
    use crate::domain::tile::Tile;

    fn world_with(tiles: Vec<Tile>) -> WorldState {
        let mut w = WorldState::new(SpeedConfig::default(), Some(7));
        w.tiles = tiles;
        w.phase = Phase::Idle;
        w
    }

    fn run_until_settled(w: &mut WorldState) -> Vec<GameEvent> {
        let mut all = Vec::new();
        for _ in 0..500 {
            all.extend(step(w, None));
            if w.phase == Phase::Idle || w.phase == Phase::GameOver {
                return all;
            }
        }
        panic!("move cycle never settled, stuck in {:?}", w.phase);
    }

    #[test]
    fn full_move_cycle_merges_then_spawns() {
        let mut w = world_with(vec![Tile::new(2, 0, 0), Tile::new(2, 0, 1)]);

        let ev = step(&mut w, Some(Direction::Left));
        assert_eq!(w.phase, Phase::Sliding);
        assert_eq!(w.moves, 1);
        assert!(matches!(ev[0], GameEvent::MoveApplied { .. }));
        assert!(ev
            .iter()
            .any(|e| matches!(e, GameEvent::TilesMerged { value: 4, .. })));

        let ev = run_until_settled(&mut w);
        assert_eq!(w.phase, Phase::Idle);
        // merged pair became one tile, plus one spawned
        assert_eq!(w.tiles.len(), 2);
        assert!(ev.iter().any(|e| matches!(e, GameEvent::TileSpawned { .. })));
        assert_eq!(w.highest_value(), 4);

        // fully settled: every tile at its target, logical cell synced
        for t in &w.tiles {
            assert_eq!(t.x, t.target_x);
            assert_eq!(t.y, t.target_y);
            assert_eq!((t.row, t.col), t.target_cell());
            assert_eq!(t.pop_remaining, 0);
        }
    }

    #[test]
    fn merging_phase_runs_after_the_slide() {
        let mut w = world_with(vec![Tile::new(2, 0, 0), Tile::new(2, 0, 3)]);
        step(&mut w, Some(Direction::Left));

        let mut saw_merging = false;
        for _ in 0..500 {
            step(&mut w, None);
            if w.phase == Phase::Merging {
                saw_merging = true;
            }
            if w.phase == Phase::Idle {
                break;
            }
        }
        assert!(saw_merging);
    }

    #[test]
    fn plain_slide_skips_the_merging_phase() {
        let mut w = world_with(vec![Tile::new(2, 0, 3)]);
        step(&mut w, Some(Direction::Left));

        for _ in 0..500 {
            step(&mut w, None);
            assert_ne!(w.phase, Phase::Merging);
            if w.phase == Phase::Idle {
                return;
            }
        }
        panic!("never settled");
    }

    #[test]
    fn illegal_direction_is_a_noop() {
        let mut w = world_with(vec![Tile::new(2, 0, 0)]);
        let ev = step(&mut w, Some(Direction::Left));
        assert_eq!(w.phase, Phase::Idle);
        assert!(ev.is_empty());
        assert_eq!(w.tiles.len(), 1); // no spawn either
        assert_eq!(w.moves, 0);
    }

    #[test]
    fn input_is_ignored_outside_idle() {
        let mut w = world_with(vec![Tile::new(2, 0, 3)]);
        step(&mut w, Some(Direction::Left));
        assert_eq!(w.phase, Phase::Sliding);

        step(&mut w, Some(Direction::Right));
        assert_eq!(w.moves, 1);
        // still headed for the left edge
        assert_eq!(w.tiles[0].target_cell(), (0, 0));
    }

    #[test]
    fn locked_spawn_ends_the_game() {
        // Full except (3,3); its neighbors are 8 and 16, so the board
        // locks whichever value spawns there.
        let rows = [
            [2, 4, 2, 4],
            [4, 2, 4, 2],
            [2, 4, 2, 16],
            [8, 16, 8, 0],
        ];
        let mut tiles = Vec::new();
        for (r, row) in rows.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                if v > 0 {
                    tiles.push(Tile::new(v, r, c));
                }
            }
        }
        let mut w = world_with(tiles);
        w.phase = Phase::Settling;

        let ev = step(&mut w, None);
        assert_eq!(w.phase, Phase::GameOver);
        assert!(w.game_over());
        assert!(ev.iter().any(|e| matches!(e, GameEvent::BoardLocked)));
        assert_eq!(w.tiles.len(), 16);
    }

    #[test]
    fn start_game_spawns_two_tiles() {
        let mut w = WorldState::new(SpeedConfig::default(), Some(3));
        w.start_game();
        assert_eq!(w.phase, Phase::Idle);
        assert_eq!(w.tiles.len(), 2);
        assert!(w.tiles.iter().all(|t| t.value == 2 || t.value == 4));
    }

    #[test]
    fn title_and_game_over_ignore_input() {
        let mut w = WorldState::new(SpeedConfig::default(), Some(1));
        assert_eq!(w.phase, Phase::Title);
        assert!(step(&mut w, Some(Direction::Down)).is_empty());
        assert_eq!(w.phase, Phase::Title);

        w.phase = Phase::GameOver;
        assert!(step(&mut w, Some(Direction::Down)).is_empty());
        assert_eq!(w.phase, Phase::GameOver);
    }
}
