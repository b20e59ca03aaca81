/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use domain::grid::Direction;
use sim::event::GameEvent;
use sim::step;
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(2);

fn main() {
    let config = GameConfig::load();
    let mut world = WorldState::new(config.speed.clone(), config.seed);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Twenty48!");
    if world.game_over() {
        println!(
            "Board locked after {} moves.  Best tile: {}",
            world.moves,
            world.highest_value()
        );
    } else {
        println!(
            "Moves: {}   Best tile: {}",
            world.moves,
            world.highest_value()
        );
    }
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);

    // A direction pressed between ticks, consumed by the next tick.
    // Only captured while the board is settled; mid-animation presses
    // are dropped, never queued.
    let mut pending_dir: Option<Direction> = None;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(world, &kb, &gp) {
            break;
        }

        if world.phase == Phase::Idle {
            if let Some(dir) = detect_direction(&kb, &gp) {
                pending_dir = Some(dir);
            }
        } else {
            pending_dir = None;
        }

        if last_tick.elapsed() >= tick_rate {
            let events = step::step(world, pending_dir.take());
            process_sound_events(sound, &events);
            last_tick = Instant::now();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::MoveApplied { .. } => sfx.play_slide(),
            GameEvent::TilesMerged { value, .. } => sfx.play_merge(*value),
            GameEvent::TileSpawned { .. } => sfx.play_spawn(),
            GameEvent::BoardLocked => sfx.play_locked(),
        }
    }
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

fn detect_direction(kb: &InputState, gp: &GamepadState) -> Option<Direction> {
    if kb.any_pressed(KEYS_LEFT) {
        Some(Direction::Left)
    } else if kb.any_pressed(KEYS_RIGHT) {
        Some(Direction::Right)
    } else if kb.any_pressed(KEYS_UP) {
        Some(Direction::Up)
    } else if kb.any_pressed(KEYS_DOWN) {
        Some(Direction::Down)
    } else {
        gp.direction_pressed()
    }
}

/// Meta keys outside the slide input: menus, restart, quit.
/// Returns true when the program should exit.
fn handle_meta(world: &mut WorldState, kb: &InputState, gp: &GamepadState) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
    let esc = kb.any_pressed(&[KeyCode::Esc]) || gp.cancel_pressed();

    match world.phase {
        // ── Title Screen ──
        Phase::Title => {
            if confirm {
                world.start_game();
            } else if kb.any_pressed(KEYS_QUIT) || esc {
                return true;
            }
        }

        // ── Game Over ──
        Phase::GameOver => {
            if confirm || kb.any_pressed(KEYS_RESTART) || gp.restart_pressed() {
                world.start_game();
            } else if esc || kb.any_pressed(KEYS_QUIT) {
                world.phase = Phase::Title;
            }
        }

        // ── In game (any move-cycle phase) ──
        _ => {
            if esc {
                world.phase = Phase::Title;
            } else if kb.any_pressed(KEYS_RESTART) || gp.restart_pressed() {
                world.start_game();
                world.set_message("Board reset", 40);
            }
        }
    }

    false
}
