/// Wire-level game state and the movement vocabulary.
///
/// The server pushes a full state object on every frame it cares to send:
///
/// ```json
/// { "grid": [["#","-"],["-"," "]],
///   "player": {"x": 1, "y": 1},
///   "basic_tiles": {"#": "wall"},
///   "message": "hello" }
/// ```
///
/// Everything but `grid` is optional. The client never mutates a received
/// state; it only swaps its cached copy for the new one.

use std::collections::HashMap;

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct GameState {
    pub grid: Vec<Vec<String>>,
    #[serde(default)]
    pub player: Option<PlayerPos>,
    /// Legend: tile code → description. Some servers send richer values
    /// (arrays, objects); accept anything JSON and stringify for display.
    #[serde(default)]
    pub basic_tiles: Option<HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct PlayerPos {
    pub x: f64,
    pub y: f64,
}

impl PlayerPos {
    /// Grid cell of the player, or None for non-finite/negative coordinates.
    pub fn cell(&self) -> Option<(usize, usize)> {
        if self.x.is_finite() && self.y.is_finite() && self.x >= 0.0 && self.y >= 0.0 {
            Some((self.x as usize, self.y as usize))
        } else {
            None
        }
    }
}

impl GameState {
    pub fn rows(&self) -> usize {
        self.grid.len()
    }

    /// Column count of the widest row. Rows are rectangular per protocol,
    /// but a ragged grid must not break bounds checks elsewhere.
    pub fn cols(&self) -> usize {
        self.grid.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    /// Tile code at (x, y), if in bounds.
    pub fn code_at(&self, x: usize, y: usize) -> Option<&str> {
        self.grid.get(y).and_then(|row| row.get(x)).map(|s| s.as_str())
    }

    /// Player cell clamped to validity (finite, non-negative).
    pub fn player_cell(&self) -> Option<(usize, usize)> {
        self.player.as_ref().and_then(|p| p.cell())
    }
}

// ── Movement vocabulary ──

/// The four canonical movement tokens the server understands.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Up,
    Down,
    Left,
    Right,
}

impl MoveDir {
    /// Wire token: the protocol speaks in wasd letters.
    pub fn token(self) -> &'static str {
        match self {
            MoveDir::Up => "w",
            MoveDir::Down => "s",
            MoveDir::Left => "a",
            MoveDir::Right => "d",
        }
    }

    pub fn facing(self) -> Facing {
        match self {
            MoveDir::Up => Facing::Up,
            MoveDir::Down => Facing::Down,
            MoveDir::Left => Facing::Left,
            MoveDir::Right => Facing::Right,
        }
    }
}

/// Player heading, in 90° steps. Local-only: tracked from directional
/// presses and consumed by the renderer for the sprite; never sent.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Up,
    Right,
    Down,
    Left,
}

impl Facing {
    /// Sprite glyph for the player at this heading.
    pub fn glyph(self) -> char {
        match self {
            Facing::Up => '▲',
            Facing::Right => '▶',
            Facing::Down => '▼',
            Facing::Left => '◀',
        }
    }

    /// Heading angle in screen radians (x right, y down). Right = 0.
    pub fn angle(self) -> f32 {
        match self {
            Facing::Right => 0.0,
            Facing::Down => std::f32::consts::FRAC_PI_2,
            Facing::Left => std::f32::consts::PI,
            Facing::Up => -std::f32::consts::FRAC_PI_2,
        }
    }
}
