/// Day/night themes and the tile → glyph/color table.
///
/// Every tile category maps to a two-column glyph pair plus explicit RGB
/// colors (each grid cell spans two terminal columns). The mapping is
/// exhaustive over `TileKind`, so an unrecognized server code can only ever
/// land on the default-floor arm, never on a missing lookup.
///
/// The chosen theme persists across runs in `theme.dat` next to the config,
/// one key-value line, read at startup and written on toggle.

use crossterm::style::Color;

use crate::config;
use crate::domain::tile::{DecodedTile, TileKind};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Theme {
    Day,
    Night,
}

impl Theme {
    pub fn toggled(self) -> Theme {
        match self {
            Theme::Day => Theme::Night,
            Theme::Night => Theme::Day,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Day => "day",
            Theme::Night => "night",
        }
    }

    /// Background for all otherwise-empty terminal cells. Explicit RGB so
    /// the inter-row gap pixels match the cell color on VTE terminals.
    pub fn base_bg(self) -> Color {
        match self {
            Theme::Day => Color::Rgb { r: 225, g: 222, b: 210 },
            Theme::Night => Color::Rgb { r: 22, g: 22, b: 35 },
        }
    }

    pub fn text(self) -> Color {
        match self {
            Theme::Day => Color::Rgb { r: 40, g: 40, b: 45 },
            Theme::Night => Color::Rgb { r: 220, g: 220, b: 225 },
        }
    }

    pub fn dim_text(self) -> Color {
        match self {
            Theme::Day => Color::Rgb { r: 130, g: 128, b: 120 },
            Theme::Night => Color::Rgb { r: 110, g: 110, b: 125 },
        }
    }

    pub fn hud_bg(self) -> Color {
        match self {
            Theme::Day => Color::Rgb { r: 180, g: 185, b: 200 },
            Theme::Night => Color::Rgb { r: 20, g: 20, b: 60 },
        }
    }

    pub fn accent(self) -> Color {
        match self {
            Theme::Day => Color::Rgb { r: 160, g: 110, b: 10 },
            Theme::Night => Color::Rgb { r: 255, g: 220, b: 50 },
        }
    }

    pub fn player(self) -> Color {
        match self {
            Theme::Day => Color::Rgb { r: 180, g: 130, b: 0 },
            Theme::Night => Color::Rgb { r: 255, g: 230, b: 60 },
        }
    }
}

/// Glyph pair and colors for one grid cell.
#[derive(Clone, Copy, Debug)]
pub struct TileVisual {
    pub ch: [char; 2],
    pub fg: Color,
    pub bg: Color,
}

/// Resolve a decoded tile to its visual under the given theme.
/// Total: unknown categories and the player spawn marker fall back to the
/// default floor.
pub fn tile_visual(d: DecodedTile, theme: Theme) -> TileVisual {
    // (day, night) pairs
    let pick = |day: (u8, u8, u8), night: (u8, u8, u8)| -> Color {
        let (r, g, b) = match theme {
            Theme::Day => day,
            Theme::Night => night,
        };
        Color::Rgb { r, g, b }
    };
    let base = theme.base_bg();

    let floor_default = TileVisual {
        ch: ['·', ' '],
        fg: pick((150, 148, 140), (90, 90, 105)),
        bg: pick((210, 207, 196), (38, 38, 52)),
    };

    let mut v = match d.kind {
        TileKind::Empty => TileVisual { ch: [' ', ' '], fg: theme.text(), bg: base },
        TileKind::Wall => match d.variant {
            Some(1) => TileVisual {
                // wood panelling
                ch: ['▓', '▓'],
                fg: pick((150, 100, 50), (180, 120, 60)),
                bg: pick((110, 72, 35), (100, 65, 30)),
            },
            _ => TileVisual {
                // concrete
                ch: ['█', '█'],
                fg: pick((140, 140, 140), (120, 120, 120)),
                bg: pick((105, 105, 105), (70, 70, 70)),
            },
        },
        TileKind::Floor => match d.variant {
            Some(1) => TileVisual {
                // wood boards
                ch: ['╌', ' '],
                fg: pick((140, 100, 55), (150, 110, 70)),
                bg: pick((200, 170, 130), (55, 40, 25)),
            },
            Some(2) => TileVisual {
                // carpet
                ch: ['░', '░'],
                fg: pick((170, 80, 80), (140, 60, 60)),
                bg: pick((205, 150, 150), (70, 25, 25)),
            },
            Some(3) => TileVisual {
                // tiled floor
                ch: ['▫', ' '],
                fg: pick((120, 140, 150), (100, 130, 150)),
                bg: pick((190, 200, 205), (35, 48, 58)),
            },
            _ => floor_default,
        },
        TileKind::Door => TileVisual {
            ch: ['▐', '▌'],
            fg: pick((150, 110, 30), (200, 160, 60)),
            bg: pick((190, 165, 110), (60, 45, 15)),
        },
        TileKind::Keycard => TileVisual {
            ch: ['<', ' '],
            fg: pick((20, 120, 160), (100, 220, 255)),
            bg: floor_default.bg,
        },
        TileKind::Special => TileVisual {
            ch: ['?', ' '],
            fg: pick((160, 120, 0), (255, 220, 80)),
            bg: floor_default.bg,
        },
        TileKind::Enemy => TileVisual {
            ch: ['Ψ', ' '],
            fg: pick((190, 40, 40), (255, 80, 80)),
            bg: floor_default.bg,
        },
        TileKind::StairsUp => TileVisual {
            ch: ['^', '^'],
            fg: pick((40, 130, 60), (140, 255, 160)),
            bg: floor_default.bg,
        },
        TileKind::StairsDown => TileVisual {
            ch: ['v', 'v'],
            fg: pick((40, 100, 130), (120, 200, 255)),
            bg: floor_default.bg,
        },
        TileKind::Landing => TileVisual {
            ch: ['@', ' '],
            fg: theme.dim_text(),
            bg: floor_default.bg,
        },
        TileKind::Chest => TileVisual {
            ch: ['▣', ' '],
            fg: pick((170, 120, 20), (230, 180, 70)),
            bg: floor_default.bg,
        },
        TileKind::Powerup => TileVisual {
            ch: ['◉', ' '],
            fg: pick((120, 60, 180), (180, 120, 255)),
            bg: floor_default.bg,
        },
        TileKind::PlayerMark | TileKind::Unknown => floor_default,
    };

    // Id-carrying tiles show their first suffix character as a label.
    if let Some(label) = d.label {
        v.ch[1] = label;
    }
    v
}

/// Scale a color toward black; the dimming pass outside the vision cutout.
/// Non-RGB colors collapse to dark grey rather than guessing channels.
pub fn dim(c: Color, factor: f32) -> Color {
    let f = factor.clamp(0.0, 1.0);
    match c {
        Color::Rgb { r, g, b } => Color::Rgb {
            r: (r as f32 * f) as u8,
            g: (g as f32 * f) as u8,
            b: (b as f32 * f) as u8,
        },
        _ => Color::Rgb { r: 40, g: 40, b: 40 },
    }
}

// ── Persistence ──

const THEME_FILE: &str = "theme.dat";

/// Read the persisted theme preference. Missing or garbled file → Day.
pub fn load_theme() -> Theme {
    for dir in config::candidate_dirs() {
        let path = dir.join(THEME_FILE);
        if let Ok(text) = std::fs::read_to_string(&path) {
            for line in text.lines() {
                if let Some(value) = line.strip_prefix("theme=") {
                    return match value.trim() {
                        "night" => Theme::Night,
                        _ => Theme::Day,
                    };
                }
            }
        }
    }
    Theme::Day
}

/// Persist the theme preference. Best-effort: a read-only install directory
/// is not worth failing over.
pub fn store_theme(theme: Theme) {
    let dirs = config::candidate_dirs();
    for dir in &dirs {
        let path = dir.join(THEME_FILE);
        if std::fs::write(&path, format!("theme={}\n", theme.name())).is_ok() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::decode;

    #[test]
    fn resolution_is_total_over_arbitrary_codes() {
        for code in ["#", "#0", "#1", " 2", "=4", "Z", "", "~~~", "E7"] {
            let _ = tile_visual(decode(code), Theme::Day);
            let _ = tile_visual(decode(code), Theme::Night);
        }
    }

    #[test]
    fn wall_variants_differ() {
        let concrete = tile_visual(decode("#0"), Theme::Night);
        let wood = tile_visual(decode("#1"), Theme::Night);
        assert_ne!(concrete.ch, wood.ch);
    }

    #[test]
    fn unknown_code_renders_as_default_floor() {
        let unknown = tile_visual(decode("Z"), Theme::Night);
        let floor = tile_visual(decode(" "), Theme::Night);
        assert_eq!(unknown.ch, floor.ch);
    }

    #[test]
    fn door_id_shows_as_label() {
        let v = tile_visual(decode("=7"), Theme::Night);
        assert_eq!(v.ch[1], '7');
    }

    #[test]
    fn dim_scales_rgb() {
        let c = dim(Color::Rgb { r: 100, g: 200, b: 50 }, 0.5);
        assert_eq!(c, Color::Rgb { r: 50, g: 100, b: 25 });
        // Factor clamps; never brightens past the original.
        let c = dim(Color::Rgb { r: 10, g: 10, b: 10 }, 2.0);
        assert_eq!(c, Color::Rgb { r: 10, g: 10, b: 10 });
    }
}
