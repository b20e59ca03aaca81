/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker from full-screen redraws, which matters
/// here because tiles glide across the board every frame.
///
/// The board is drawn from the tiles' animated virtual-pixel
/// positions: one board cell is CELL_PX virtual pixels square in the
/// core and CELL_W x CELL_H terminal cells here.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::grid::{COLS, ROWS};
use crate::domain::tile::{Tile, CELL_PX};
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, used
    /// for both Clear and every blank cell so inter-row gap pixels
    /// match on VTE-based terminals.
    const BASE_BG: Color = Color::Rgb { r: 24, g: 22, b: 30 };

    const BLANK: Cell = Cell {
        ch: ' ',
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: '?',
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    fn from_char(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell::from_char(ch, fg, bg));
            cx += 1;
        }
    }
}

// ── Board geometry ──

/// Terminal columns / rows per board cell.
const CELL_W: usize = 9;
const CELL_H: usize = 4;

/// Board footprint including the outer lattice line.
const BOARD_W: usize = COLS * CELL_W + 1;
const BOARD_H: usize = ROWS * CELL_H + 1;

/// Vertical offsets
const HUD_ROW: usize = 0;
const BOARD_ROW: usize = 2;

// ── Board colors (from the classic palette) ──

const FELT: Color = Color::Rgb { r: 205, g: 192, b: 180 };
const OUTLINE: Color = Color::Rgb { r: 187, g: 173, b: 160 };
const TILE_TEXT: Color = Color::Rgb { r: 119, g: 110, b: 101 };

/// Tile background by value; values past 512 reuse the last entry.
const PALETTE: [Color; 9] = [
    Color::Rgb { r: 237, g: 229, b: 218 }, // 2
    Color::Rgb { r: 238, g: 225, b: 201 }, // 4
    Color::Rgb { r: 243, g: 178, b: 122 }, // 8
    Color::Rgb { r: 246, g: 150, b: 101 }, // 16
    Color::Rgb { r: 247, g: 124, b: 95 },  // 32
    Color::Rgb { r: 247, g: 95, b: 59 },   // 64
    Color::Rgb { r: 237, g: 208, b: 115 }, // 128
    Color::Rgb { r: 237, g: 204, b: 99 },  // 256
    Color::Rgb { r: 236, g: 202, b: 80 },  // 512+
];

fn value_color(value: u32) -> Color {
    let index = (value.max(2).trailing_zeros() as usize - 1).min(PALETTE.len() - 1);
    PALETTE[index]
}

/// Which full-screen layout a phase belongs to. The four in-game
/// phases share one layout so phase flips inside a move don't force
/// full repaints.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Screen {
    Title,
    Game,
    GameOver,
}

fn screen_of(phase: Phase) -> Screen {
    match phase {
        Phase::Title => Screen::Title,
        Phase::GameOver => Screen::GameOver,
        _ => Screen::Game,
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_screen: Option<Screen>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_screen: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(
                self.writer,
                SetBackgroundColor(Cell::BASE_BG),
                Clear(ClearType::All)
            )?;
        }

        // Detect screen change → clear for a clean transition
        let screen = screen_of(world.phase);
        if self.last_screen != Some(screen) {
            self.back.cells.fill(Cell::INVALID);
            queue!(
                self.writer,
                SetBackgroundColor(Cell::BASE_BG),
                Clear(ClearType::All)
            )?;
            self.last_screen = Some(screen);
        }

        // Build front buffer
        self.front.clear();
        match screen {
            Screen::Title => self.compose_title(world),
            Screen::Game => self.compose_game(world),
            Screen::GameOver => {
                self.compose_game(world);
                self.compose_locked_overlay(world);
            }
        }

        // Diff and emit
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Set explicit base colors at start of frame. No ResetColor
        // here: the terminal default may differ from BASE_BG and
        // would show as line artifacts.
        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    fn board_origin_x(&self) -> usize {
        self.front.width.saturating_sub(BOARD_W) / 2
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, w: &WorldState) {
        let buf_w = self.front.width;

        // ── HUD row ──
        let hud = format!(
            " TWENTY48   Moves:{:<6} Best:{:<6}",
            w.moves,
            w.highest_value()
        );
        let hud_bg = Color::Rgb { r: 20, g: 20, b: 60 };
        for x in 0..buf_w {
            self.front
                .set(x, HUD_ROW, Cell::from_char(' ', Color::White, hud_bg));
        }
        self.front.put_str(0, HUD_ROW, &hud, Color::White, hud_bg);

        self.compose_board(w);

        // ── Message bar ──
        let msg_row = BOARD_ROW + BOARD_H + 1;
        if msg_row < self.front.height && !w.message.is_empty() {
            let msg = format!(" ◈ {} ", w.message);
            let msg_bg = Color::Rgb { r: 200, g: 180, b: 50 };
            for x in 0..buf_w {
                self.front
                    .set(x, msg_row, Cell::from_char(' ', Color::Black, msg_bg));
            }
            self.front.put_str(0, msg_row, &msg, Color::Black, msg_bg);
        }

        // ── Help bar ──
        let help_row = BOARD_ROW + BOARD_H + 3;
        if help_row < self.front.height {
            let help = " ←→↑↓ / WASD: Slide   R: Restart   ESC: Title";
            self.front
                .put_str(0, help_row, help, Color::DarkGrey, Cell::BASE_BG);
        }
    }

    /// Felt, lattice lines, then every tile at its animated position.
    fn compose_board(&mut self, w: &WorldState) {
        let ox = self.board_origin_x();

        for y in 0..BOARD_H {
            for x in 0..BOARD_W {
                let on_line = x % CELL_W == 0 || y % CELL_H == 0;
                let bg = if on_line { OUTLINE } else { FELT };
                self.front
                    .set(ox + x, BOARD_ROW + y, Cell::from_char(' ', TILE_TEXT, bg));
            }
        }

        // Popping tiles drawn last so the bulge stays on top
        let pop_total = w.speed.merge_pop_ticks;
        for t in w.tiles.iter().filter(|t| t.pop_remaining == 0) {
            self.compose_tile(t, 0.0);
        }
        for t in w.tiles.iter().filter(|t| t.pop_remaining > 0) {
            self.compose_tile(t, t.pop_progress(pop_total));
        }
    }

    /// One tile block at its animated virtual-pixel position.
    fn compose_tile(&mut self, t: &Tile, pop: f32) {
        let ox = self.board_origin_x();
        let tx = (t.x / CELL_PX * CELL_W as f32).round() as usize;
        let ty = (t.y / CELL_PX * CELL_H as f32).round() as usize;

        let mut x0 = ox + tx + 1;
        let mut bw = CELL_W - 1;
        let y0 = BOARD_ROW + ty + 1;
        let bh = CELL_H - 1;
        // Pop peak bulges one column out each side; terminal cells are
        // tall, so the horizontal bulge alone reads as a scale-up.
        if pop > 0.5 {
            x0 = x0.saturating_sub(1);
            bw += 2;
        }

        let bg = value_color(t.value);
        let fg = if pop > 0.0 { Color::White } else { TILE_TEXT };

        for yy in y0..y0 + bh {
            for xx in x0..x0 + bw {
                self.front.set(xx, yy, Cell::from_char(' ', fg, bg));
            }
        }

        let label = t.value.to_string();
        let lx = x0 + bw.saturating_sub(label.len()) / 2;
        self.front.put_str(lx, y0 + bh / 2, &label, fg, bg);
    }

    // ── Static screens ──

    fn compose_title(&mut self, w: &WorldState) {
        let art = [
            "██████    ██████  ██   ██  █████ ",
            "     ██  ██    ██ ██   ██ ██   ██",
            " █████   ██    ██ ███████  █████ ",
            "██       ██    ██      ██ ██   ██",
            "███████   ██████       ██  █████ ",
        ];
        let gold = Color::Rgb { r: 255, g: 200, b: 50 };
        let ax = self.front.width.saturating_sub(art[0].chars().count()) / 2;
        for (i, line) in art.iter().enumerate() {
            self.front.put_str(ax, 2 + i, line, gold, Cell::BASE_BG);
        }

        let subtitle = "◈◈  sliding-tile merge puzzle  ◈◈";
        let sx = self.front.width.saturating_sub(subtitle.chars().count()) / 2;
        let green = Color::Rgb { r: 80, g: 255, b: 80 };
        self.front.put_str(sx, 8, subtitle, green, Cell::BASE_BG);

        let tagline = "━━━ Terminal Edition (Rust) ━━━";
        let tx = self.front.width.saturating_sub(tagline.chars().count()) / 2;
        self.front.put_str(
            tx,
            10,
            tagline,
            Color::Rgb { r: 180, g: 140, b: 50 },
            Cell::BASE_BG,
        );

        // Menu options
        let menu_base = 13;
        self.front
            .put_str(10, menu_base, "ENTER   New Game", green, Cell::BASE_BG);
        self.front
            .put_str(10, menu_base + 1, "  Q     Quit", Color::White, Cell::BASE_BG);

        // Controls reference
        let help = [
            "Controls",
            "  ←→↑↓ / WASD   Slide tiles",
            "  R             Restart board",
            "  ESC           Back / Quit",
            "  Pad: D-pad Slide   Start Confirm",
        ];
        let help_base = menu_base + 3;
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { gold } else { Color::White };
            self.front
                .put_str(10, help_base + i, line, color, Cell::BASE_BG);
        }

        // Message bar (bottom row)
        if !w.message.is_empty() {
            let msg_row = self.front.height.saturating_sub(1);
            let msg = format!(" ◈ {} ", w.message);
            let msg_bg = Color::Rgb { r: 200, g: 180, b: 50 };
            let buf_w = self.front.width;
            for x in 0..buf_w {
                self.front
                    .set(x, msg_row, Cell::from_char(' ', Color::Black, msg_bg));
            }
            self.front.put_str(0, msg_row, &msg, Color::Black, msg_bg);
        }
    }

    /// Game-over box drawn over the final board.
    fn compose_locked_overlay(&mut self, w: &WorldState) {
        let blink = (w.anim_tick / 8) % 2 == 0;
        let headline = if blink {
            "✕  BOARD LOCKED  ✕"
        } else {
            "BOARD LOCKED"
        };
        let stats = format!("Moves: {}   Best tile: {}", w.moves, w.highest_value());
        let prompt = "ENTER: New Game   ESC: Title";

        let inner = stats
            .chars()
            .count()
            .max(prompt.chars().count())
            .max(headline.chars().count())
            + 4;
        let top = format!("╔{}╗", "═".repeat(inner));
        let bottom = format!("╚{}╝", "═".repeat(inner));

        let cx = self.front.width.saturating_sub(inner + 2) / 2;
        let cy = BOARD_ROW + BOARD_H / 2 - 2;

        let red = Color::Rgb { r: 255, g: 60, b: 60 };
        let bg = Color::Rgb { r: 40, g: 16, b: 16 };

        self.front.put_str(cx, cy, &top, red, bg);
        self.front.put_str(cx, cy + 1, &boxed(headline, inner), red, bg);
        self.front.put_str(cx, cy + 2, &boxed("", inner), red, bg);
        self.front
            .put_str(cx, cy + 3, &boxed(&stats, inner), Color::White, bg);
        self.front.put_str(
            cx,
            cy + 4,
            &boxed(prompt, inner),
            Color::Rgb { r: 80, g: 255, b: 80 },
            bg,
        );
        self.front.put_str(cx, cy + 5, &bottom, red, bg);
    }
}

fn boxed(content: &str, width: usize) -> String {
    format!("║{content:^width$}║")
}
