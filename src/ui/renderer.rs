/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The world is laid out in pixels (800x600 by default). Every frame the
/// board is scaled to whatever the terminal offers below the HUD row, so
/// a world rectangle maps to a block of cells. The renderer only reads
/// `GameState::scene()`; it never mutates game state.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::WorldConfig;
use crate::domain::map::MapId;
use crate::sim::world::{GameState, Phase, Scene};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BASE_BG: Color = Color::Rgb { r: 0, g: 0, b: 0 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };
}

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
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

    fn fill(&mut self, bg: Color) {
        self.cells.fill(Cell { ch: ' ', fg: Color::White, bg });
    }

    /// Fill a cell rectangle, clipped to the buffer.
    fn fill_rect(&mut self, r: CellRect, bg: Color) {
        for y in r.y0..r.y1.min(self.height) {
            for x in r.x0..r.x1.min(self.width) {
                self.set(x, y, Cell { ch: ' ', fg: Color::White, bg });
            }
        }
    }

    /// One-cell outline around a rectangle.
    fn outline_rect(&mut self, r: CellRect, fg: Color, bg: Color) {
        if r.x1 <= r.x0 || r.y1 <= r.y0 { return; }
        let (x_last, y_last) = (r.x1 - 1, r.y1 - 1);
        for x in r.x0..r.x1 {
            self.set(x, r.y0, Cell { ch: '─', fg, bg });
            self.set(x, y_last, Cell { ch: '─', fg, bg });
        }
        for y in r.y0..r.y1 {
            self.set(r.x0, y, Cell { ch: '│', fg, bg });
            self.set(x_last, y, Cell { ch: '│', fg, bg });
        }
        self.set(r.x0, r.y0, Cell { ch: '┌', fg, bg });
        self.set(x_last, r.y0, Cell { ch: '┐', fg, bg });
        self.set(r.x0, y_last, Cell { ch: '└', fg, bg });
        self.set(x_last, y_last, Cell { ch: '┘', fg, bg });
    }

    /// Write a string at (x, y). Text keeps the background already there.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        for (i, ch) in s.chars().enumerate() {
            let cx = x + i;
            if cx >= self.width { break; }
            let bg = self.get(cx, y).bg;
            self.set(cx, y, Cell { ch, fg, bg });
        }
    }
}

// ── World → cell scaling ──

/// Half-open cell rectangle `[x0, x1) x [y0, y1)`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct CellRect {
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
}

/// Maps world pixels onto the board area of the terminal.
#[derive(Clone, Copy, Debug)]
struct Viewport {
    world_w: i32,
    world_h: i32,
    cols: usize,
    rows: usize,
    top: usize,
}

impl Viewport {
    fn col(&self, x: i32) -> i64 {
        x as i64 * self.cols as i64 / self.world_w.max(1) as i64
    }

    fn row(&self, y: i32) -> i64 {
        y as i64 * self.rows as i64 / self.world_h.max(1) as i64
    }

    /// Scale a world rectangle to cells, clipped to the board.
    /// Returns None if nothing of it is visible. Non-empty rects keep at
    /// least one cell so small sprites never vanish.
    fn rect(&self, x: i32, y: i32, w: i32, h: i32) -> Option<CellRect> {
        let (c0, c1) = (self.col(x), self.col(x + w).max(self.col(x) + 1));
        let (r0, r1) = (self.row(y), self.row(y + h).max(self.row(y) + 1));
        let cx0 = c0.max(0);
        let cy0 = r0.max(0);
        let cx1 = c1.min(self.cols as i64);
        let cy1 = r1.min(self.rows as i64);
        if cx0 >= cx1 || cy0 >= cy1 {
            return None;
        }
        Some(CellRect {
            x0: cx0 as usize,
            y0: cy0 as usize + self.top,
            x1: cx1 as usize,
            y1: cy1 as usize + self.top,
        })
    }

    /// Screen cell for a world point, clamped onto the board.
    fn point(&self, x: i32, y: i32) -> (usize, usize) {
        let c = self.col(x).clamp(0, self.cols.saturating_sub(1) as i64) as usize;
        let r = self.row(y).clamp(0, self.rows.saturating_sub(1) as i64) as usize;
        (c, r + self.top)
    }
}

// ── Palette ──

const PLAYER: Color = Color::Rgb { r: 255, g: 0, b: 0 };
const REGULAR_ENEMY: Color = Color::Rgb { r: 0, g: 0, b: 255 };
const BOSS_ENEMY: Color = Color::Rgb { r: 255, g: 215, b: 0 };
const BLACK: Color = Color::Rgb { r: 0, g: 0, b: 0 };
const WHITE: Color = Color::Rgb { r: 255, g: 255, b: 255 };
const HUD_FG: Color = Color::Rgb { r: 180, g: 180, b: 180 };

fn map_color(map: MapId) -> Color {
    match map {
        MapId::Village => Color::Rgb { r: 100, g: 200, b: 100 },
        MapId::Field => Color::Rgb { r: 34, g: 139, b: 34 },
        MapId::Campus => Color::Rgb { r: 169, g: 169, b: 169 },
    }
}

// ── Renderer ──

const HUD_ROW: usize = 0;
const BOARD_ROW: usize = 1;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            enhanced_keys: false,
        }
    }

    /// Enter raw mode + alternate screen. Returns true if the terminal
    /// will report key releases (keyboard enhancement enabled).
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);

        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        // Force full repaint: back differs from front for every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, state: &GameState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(state.phase) {
            self.back.cells.fill(Cell::INVALID);
            self.last_phase = Some(state.phase);
        }

        compose(&mut self.front, state);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) { continue; }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
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
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}

// ── Compose: build front buffer content ──

/// Battle screen geometry in world pixels, proportional to the board
/// (200x200 enemy at (300,100) and a bottom third message box on 800x600).
struct BattleLayout {
    enemy: (i32, i32, i32, i32),
    message_box: (i32, i32, i32, i32),
    text_x: i32,
    text_rows: [i32; 3],
}

impl BattleLayout {
    fn for_world(world: &WorldConfig) -> Self {
        let (w, h) = (world.screen_width, world.screen_height);
        BattleLayout {
            enemy: (w * 3 / 8, h / 6, w / 4, h / 3),
            message_box: (0, h * 2 / 3, w, h - h * 2 / 3),
            text_x: w / 16,
            text_rows: [h * 7 / 10, h * 47 / 60, h * 13 / 15],
        }
    }
}

fn compose(buf: &mut FrameBuffer, state: &GameState) {
    buf.fill(Cell::BASE_BG);
    if buf.width == 0 || buf.height <= BOARD_ROW { return; }

    let world: &WorldConfig = &state.config.world;
    let vp = Viewport {
        world_w: world.screen_width,
        world_h: world.screen_height,
        cols: buf.width,
        rows: buf.height - BOARD_ROW,
        top: BOARD_ROW,
    };

    match state.scene() {
        Scene::Map { map, position, size, caption } => {
            let hud = format!(
                " Map {}/{}  {:<8} x:{:<4} y:{:<4}{}",
                map.index() + 1, MapId::ALL.len(), map.name(),
                position.x, position.y,
                if state.in_grace() { "  (catching breath...)" } else { "" },
            );
            buf.put_str(0, HUD_ROW, &hud, HUD_FG);

            if let Some(board) = vp.rect(0, 0, world.screen_width, world.screen_height) {
                buf.fill_rect(board, map_color(map));
            }
            if let Some(p) = vp.rect(position.x, position.y, size, size) {
                buf.fill_rect(p, PLAYER);
            }
            let (cx, cy) = vp.point(20, 20);
            buf.put_str(cx, cy, caption, BLACK);
            let help = "Arrows/WASD: move   Ctrl+C: quit";
            buf.put_str(0, buf.height - 1, help, BLACK);
        }
        Scene::Battle { enemy_hp, is_boss, message, sub_message } => {
            let hud = if is_boss { " BOSS BATTLE" } else { " BATTLE" };
            buf.put_str(0, HUD_ROW, hud, HUD_FG);

            let layout = BattleLayout::for_world(world);
            let enemy = if is_boss { BOSS_ENEMY } else { REGULAR_ENEMY };
            let (ex, ey, ew, eh) = layout.enemy;
            if let Some(r) = vp.rect(ex, ey, ew, eh) {
                buf.fill_rect(r, enemy);
            }
            let (bx, by, bw, bh) = layout.message_box;
            if let Some(r) = vp.rect(bx, by, bw, bh) {
                buf.fill_rect(r, BLACK);
                buf.outline_rect(r, WHITE, BLACK);
            }
            let hp = format!("Enemy HP: {enemy_hp}");
            let [m_y, hp_y, sub_y] = layout.text_rows;
            for (wy, text) in [(m_y, message), (hp_y, hp.as_str()), (sub_y, sub_message)] {
                let (cx, cy) = vp.point(layout.text_x, wy);
                buf.put_str(cx, cy, text, WHITE);
            }
        }
        Scene::Ending { lines } => {
            buf.fill(WHITE);
            let mid_x = world.screen_width / 2;
            let mid_y = world.screen_height / 2;
            for (wy, text) in [(mid_y - 20, lines[0]), (mid_y + 30, lines[1])] {
                let (cx, cy) = vp.point(mid_x, wy);
                let start = cx.saturating_sub(text.chars().count() / 2);
                buf.put_str(start, cy, text, BLACK);
            }
            buf.put_str(0, buf.height - 1, "Esc: quit", HUD_FG);
        }
    }
}
