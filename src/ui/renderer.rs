/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame into `front` (an array of Cells)
///   2. Compare each cell against `back` (the previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. Batch everything with `queue!`, flush once at the end
///   5. Swap front/back
///
/// Composition never touches the terminal, so every screen can be built
/// into a plain `FrameBuffer` under test. `flush_diff` is the only I/O.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::VisionConfig;
use crate::domain::tile;
use crate::session::{Screen, Session, MENU_ITEMS};
use crate::ui::theme::{self, Theme};
use crate::ui::vision::VisionMask;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    fn blank(bg: Color) -> Cell {
        Cell { ch: ' ', fg: Color::White, bg }
    }

    /// Sentinel used to invalidate the back buffer: differs from any real
    /// cell, so every position gets diff'd on the next flush.
    const INVALID: Cell = Cell {
        ch: '\u{0}',
        fg: Color::Magenta,
        bg: Color::Magenta,
    };
}

// ── FrameBuffer: a 2D grid of Cells ──

pub(crate) struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    pub(crate) fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::blank(Color::Reset); w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::blank(Color::Reset); w * h];
        }
    }

    fn clear(&mut self, bg: Color) {
        self.cells.fill(Cell::blank(bg));
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
            Cell::blank(Color::Reset)
        }
    }

    fn put(&mut self, x: usize, y: usize, ch: char, fg: Color, bg: Color) {
        self.set(x, y, Cell { ch, fg, bg });
    }

    /// Write a string at (x, y); each char occupies one column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.put(cx, y, ch, fg, bg);
            cx += 1;
        }
    }

    /// Fill an entire row with a background color.
    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.put(x, y, ' ', Color::White, bg);
        }
    }

    #[cfg(test)]
    pub(crate) fn char_at(&self, x: usize, y: usize) -> char {
        self.get(x, y).ch
    }

    #[cfg(test)]
    pub(crate) fn fg_at(&self, x: usize, y: usize) -> Color {
        self.get(x, y).fg
    }
}

// ── Layout ──

/// Each grid cell spans two terminal columns.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// HUD + gap above the map, message + help below it.
const RESERVED_ROWS: usize = MAP_ROW + 4;

/// Dim factor applied outside the vision cutout.
const SHADOW: f32 = 0.30;

// ── Composition (pure over the buffer) ──

/// Compose the in-game view. Updates the session camera from the buffer
/// size, then draws HUD, the camera-clamped map window with the vision
/// overlay, the player on top, and the message/help bars.
pub(crate) fn compose_game(
    fb: &mut FrameBuffer,
    sess: &mut Session,
    vision: &VisionConfig,
    mask: &mut VisionMask,
) {
    let th = sess.theme;
    compose_hud(fb, sess);

    let (cols, rows, player) = match &sess.state {
        Some(s) => (s.cols(), s.rows(), s.player_cell()),
        None => {
            let wait = match sess.link {
                crate::net::connection::LinkState::Open => " waiting for server state... ",
                _ => " no connection - retrying... ",
            };
            fb.put_str(2, MAP_ROW + 1, wait, th.dim_text(), th.base_bg());
            return;
        }
    };

    // Viewport size from the buffer, capped to the grid.
    let mut view_w = fb.width / CELL_W;
    let mut view_h = fb.height.saturating_sub(RESERVED_ROWS).max(1);
    if cols > 0 {
        view_w = view_w.min(cols);
    }
    if rows > 0 {
        view_h = view_h.min(rows);
    }
    sess.camera.view_w = view_w;
    sess.camera.view_h = view_h;
    sess.camera.center_on(player, cols, rows);
    let cam = sess.camera.clone();

    // The cutout is computed in viewport coordinates: camera and player
    // screen position both change every frame.
    let player_view = player.and_then(|(px, py)| cam.world_to_view(px, py));
    mask.recompute(
        view_w,
        view_h,
        player_view,
        vision.radius,
        vision.span_radians(),
        sess.facing,
    );

    if let Some(state) = &sess.state {
        // ── Tile pass: only the camera-clamped window, player cell skipped ──
        for (wx, wy) in cam.visible_cells(cols, rows) {
            if Some((wx, wy)) == player {
                continue;
            }
            let (vx, vy) = match cam.world_to_view(wx, wy) {
                Some(v) => v,
                None => continue,
            };
            let row = MAP_ROW + vy;
            let col = vx * CELL_W;

            // Ragged rows decode as unknown → default floor.
            let code = state.code_at(wx, wy).unwrap_or("");
            let mut v = theme::tile_visual(tile::decode(code), th);

            if !mask.is_lit(vx, vy) {
                v.fg = theme::dim(v.fg, SHADOW);
                v.bg = theme::dim(v.bg, SHADOW);
            }

            fb.put(col, row, v.ch[0], v.fg, v.bg);
            fb.put(col + 1, row, v.ch[1], v.fg, v.bg);
        }

        // ── Player pass: always on top of terrain, heading glyph ──
        if let Some((vx, vy)) = player_view {
            let row = MAP_ROW + vy;
            let col = vx * CELL_W;
            let under = state
                .code_at(cam.x + vx, cam.y + vy)
                .map(|c| theme::tile_visual(tile::decode(c), th).bg)
                .unwrap_or(th.base_bg());
            fb.put(col, row, sess.facing.glyph(), th.player(), under);
            fb.put(col + 1, row, ' ', th.player(), under);
        }
    }

    // ── Message bar ──
    let msg_row = MAP_ROW + view_h + 1;
    if !sess.server_message.is_empty() {
        let msg = format!(" ◈ {} ", sess.server_message);
        fb.fill_row(msg_row, th.hud_bg());
        fb.put_str(0, msg_row, &msg, th.accent(), th.hud_bg());
    }

    // ── Help bar ──
    let help_row = MAP_ROW + view_h + 3;
    fb.put_str(
        0,
        help_row,
        " ←→↑↓ / WASD move   F1 pause   T day/night   ESC menu",
        th.dim_text(),
        th.base_bg(),
    );

    if sess.paused {
        compose_pause_overlay(fb, th, view_w, view_h);
    }
}

fn compose_hud(fb: &mut FrameBuffer, sess: &Session) {
    let th = sess.theme;
    fb.fill_row(HUD_ROW, th.hud_bg());

    let pos = sess
        .state
        .as_ref()
        .and_then(|s| s.player_cell())
        .map(|(x, y)| format!("({x},{y})"))
        .unwrap_or_else(|| "(-,-)".into());

    // Ground under the player: server legend first, builtin fallback second.
    let here = sess.state.as_ref().and_then(|s| {
        let (x, y) = s.player_cell()?;
        let code = s.code_at(x, y)?;
        Some(match sess.describe(code) {
            Some(desc) => desc.to_owned(),
            None => tile::decode(code).kind.describe().to_owned(),
        })
    });

    let mut hud = format!(
        " CRAWLINK  ◈ {}  pos {}  legend {} ",
        sess.link.label(),
        pos,
        sess.legend.len(),
    );
    if let Some(here) = here {
        hud.push_str(&format!(" on {here} "));
    }
    if sess.parse_errors > 0 {
        hud.push_str(&format!(" bad frames {} ", sess.parse_errors));
    }
    fb.put_str(0, HUD_ROW, &hud, th.text(), th.hud_bg());
}

fn compose_pause_overlay(fb: &mut FrameBuffer, th: Theme, view_w: usize, view_h: usize) {
    let view_cols = view_w * CELL_W;
    let box_w = 28_usize;
    let box_h = 5_usize;
    let box_x = view_cols.saturating_sub(box_w) / 2;
    let box_y = MAP_ROW + view_h.saturating_sub(box_h) / 2;

    let dim_bg = theme::dim(th.hud_bg(), 0.8);
    for y in box_y..box_y + box_h {
        for x in box_x..box_x + box_w {
            fb.put(x, y, ' ', th.text(), dim_bg);
        }
    }
    fb.put_str(box_x + 2, box_y + 1, "▶ PAUSED ◀", th.accent(), dim_bg);
    fb.put_str(box_x + 2, box_y + 3, "moves held - F1 resume", th.text(), dim_bg);
}

/// Compose the menu screen: navigation entries plus the theme toggle,
/// the terminal stand-in for the static landing pages.
pub(crate) fn compose_menu(fb: &mut FrameBuffer, sess: &Session) {
    let th = sess.theme;

    let title = [
        r"   ___  ___    _  _    _  _     _  _  _  _  _  __",
        r"  / __|| _ \  /_\| |  | || |   | || \| || |/ /",
        r" | (__ |   / / _ \ |/\| || |__ | || .` || ' < ",
        r"  \___||_|_\/_/ \_\__/\__||____||_||_|\_||_|\_\",
    ];
    for (i, line) in title.iter().enumerate() {
        fb.put_str(2, 1 + i, line, th.accent(), th.base_bg());
    }

    let status = format!("◈ server: {}", sess.link.label());
    fb.put_str(4, 6, &status, th.dim_text(), th.base_bg());

    let menu_base = 8;
    for (i, item) in MENU_ITEMS.iter().enumerate() {
        let selected = i == sess.menu_cursor;
        let marker = if selected { "▸ " } else { "  " };
        let fg = if selected { th.accent() } else { th.text() };
        let line = format!("{marker}{item}");
        fb.put_str(4, menu_base + i, &line, fg, th.base_bg());
    }

    let theme_line = format!("  theme: {}", sess.theme.name());
    fb.put_str(4, menu_base + MENU_ITEMS.len() + 1, &theme_line, th.dim_text(), th.base_bg());

    fb.put_str(
        4,
        menu_base + MENU_ITEMS.len() + 3,
        "↑↓ select   ENTER confirm   Q quit",
        th.dim_text(),
        th.base_bg(),
    );
}

// ── Renderer: terminal lifecycle + diff flush ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_screen: Option<Screen>,
    last_theme: Option<Theme>,
    mask: VisionMask,
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
            last_theme: None,
            mask: VisionMask::new(),
        }
    }

    pub fn init(&mut self, theme: Theme) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(theme.base_bg()),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
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

    /// Has the terminal been resized since the last frame? A yes forces a
    /// redraw even when no new state arrived.
    pub fn size_changed(&self) -> bool {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        tw as usize != self.term_w || th as usize != self.term_h
    }

    pub fn render(&mut self, sess: &mut Session, vision: &VisionConfig) -> io::Result<()> {
        let base_bg = sess.theme.base_bg();

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(base_bg), Clear(ClearType::All))?;
        }

        // Screen or theme switches repaint everything.
        let switched =
            self.last_screen != Some(sess.screen) || self.last_theme != Some(sess.theme);
        if switched {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(base_bg), Clear(ClearType::All))?;
            self.last_screen = Some(sess.screen);
            self.last_theme = Some(sess.theme);
        }

        self.front.clear(base_bg);
        match sess.screen {
            Screen::Menu => compose_menu(&mut self.front, sess),
            Screen::Game => compose_game(&mut self.front, sess, vision, &mut self.mask),
        }

        self.flush_diff(base_bg)?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    /// Emit only the cells that changed since the previous frame.
    fn flush_diff(&mut self, base_bg: Color) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = base_bg;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(base_bg),
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisionConfig;
    use crate::net::connection::parse_state;
    use crate::ui::theme::Theme;

    fn full_vision() -> VisionConfig {
        VisionConfig { radius: 100.0, span_deg: 360.0 }
    }

    fn session_with(raw: &str) -> Session {
        let mut sess = Session::new(Theme::Night);
        sess.screen = Screen::Game;
        sess.apply_state(parse_state(raw).unwrap());
        sess
    }

    #[test]
    fn two_by_two_grid_renders_player_on_top() {
        let mut sess =
            session_with(r##"{"grid":[["#","-"],["-"," "]],"player":{"x":1,"y":1}}"##);
        let mut fb = FrameBuffer::new(40, 20);
        let mut mask = VisionMask::new();

        compose_game(&mut fb, &mut sess, &full_vision(), &mut mask);

        // Player cell (1,1) → buffer column 2, map row offset 1.
        assert_eq!(fb.char_at(2, MAP_ROW + 1), sess.facing.glyph());
        // Wall at (0,0) renders its glyph, not the player's.
        assert_eq!(fb.char_at(0, MAP_ROW), '█');
    }

    #[test]
    fn player_cell_skipped_in_tile_pass() {
        // The player stands on a wall cell; the wall glyph must not show there.
        let mut sess = session_with(r##"{"grid":[["#"]],"player":{"x":0,"y":0}}"##);
        let mut fb = FrameBuffer::new(20, 12);
        let mut mask = VisionMask::new();
        compose_game(&mut fb, &mut sess, &full_vision(), &mut mask);
        assert_eq!(fb.char_at(0, MAP_ROW), sess.facing.glyph());
    }

    #[test]
    fn large_grid_culls_to_viewport() {
        let grid_rows: Vec<String> = (0..100)
            .map(|_| {
                let cells: Vec<&str> = std::iter::repeat("\" \"").take(100).collect();
                format!("[{}]", cells.join(","))
            })
            .collect();
        let raw = format!(
            r#"{{"grid":[{}],"player":{{"x":50,"y":50}}}}"#,
            grid_rows.join(",")
        );
        let mut sess = session_with(&raw);
        let mut fb = FrameBuffer::new(40, 20);
        let mut mask = VisionMask::new();
        compose_game(&mut fb, &mut sess, &full_vision(), &mut mask);

        // Viewport is 20×14: camera clamped well inside the 100×100 grid.
        assert_eq!(sess.camera.view_w, 20);
        assert!(sess.camera.x <= 100 - sess.camera.view_w);
        assert!(sess.camera.world_to_view(50, 50).is_some());
    }

    #[test]
    fn no_state_composes_placeholder() {
        let mut sess = Session::new(Theme::Night);
        sess.screen = Screen::Game;
        let mut fb = FrameBuffer::new(40, 20);
        let mut mask = VisionMask::new();
        compose_game(&mut fb, &mut sess, &full_vision(), &mut mask);
        // HUD present, no panic with nothing cached.
        assert_eq!(fb.char_at(1, HUD_ROW), 'C');
    }

    #[test]
    fn cells_outside_vision_are_dimmed() {
        let grid_rows: Vec<String> = (0..9)
            .map(|_| {
                let cells: Vec<&str> = std::iter::repeat("\"#\"").take(9).collect();
                format!("[{}]", cells.join(","))
            })
            .collect();
        let raw = format!(
            r#"{{"grid":[{}],"player":{{"x":4,"y":4}}}}"#,
            grid_rows.join(",")
        );
        let mut sess = session_with(&raw);
        let mut fb = FrameBuffer::new(60, 20);
        let mut mask = VisionMask::new();
        let vision = VisionConfig { radius: 1.5, span_deg: 360.0 };
        compose_game(&mut fb, &mut sess, &vision, &mut mask);

        let lit = fb.fg_at(3 * CELL_W, MAP_ROW + 4); // next to the player
        let dark = fb.fg_at(0, MAP_ROW); // far corner
        assert_ne!(lit, dark);
    }

    #[test]
    fn menu_lists_all_entries() {
        let sess = Session::new(Theme::Day);
        let mut fb = FrameBuffer::new(60, 24);
        compose_menu(&mut fb, &sess);
        // Cursor marker sits on the first entry.
        assert_eq!(fb.char_at(4, 8), '▸');
    }

    #[test]
    fn pause_overlay_draws_on_top() {
        let mut sess = session_with(r#"{"grid":[[" "," "],[" "," "]],"player":{"x":0,"y":0}}"#);
        sess.paused = true;
        let mut fb = FrameBuffer::new(40, 20);
        let mut mask = VisionMask::new();
        compose_game(&mut fb, &mut sess, &full_vision(), &mut mask);
        let mut found = false;
        for y in 0..20 {
            for x in 0..40 {
                if fb.char_at(x, y) == '▶' {
                    found = true;
                }
            }
        }
        assert!(found, "pause marker not composed");
    }
}
