/// Tile codes and their classification.
///
/// A tile code is a short string: the leading character picks the category,
/// an optional suffix refines it. A numeric suffix on walls and floors picks
/// a surface variant; on other categories the suffix is carried along and
/// rendered as an overlay label (door ids, staircase links, and so on).
///
/// Classification is total: any code the server invents decodes to
/// `TileKind::Unknown`, which renders as the default floor.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TileKind {
    Empty,      // '-'  void outside the map
    Wall,       // '#'
    Floor,      // ' '
    Door,       // '='  disappears server-side once unlocked
    Keycard,    // '<'
    Special,    // '?'  interactable
    Enemy,      // 'E'
    StairsUp,   // '^'
    StairsDown, // 'v'
    Landing,    // '@'  arrival point of a staircase
    Chest,      // 'c'
    Powerup,    // 'p'
    PlayerMark, // '*'  spawn marker; servers strip it but stale grids may not
    Unknown,
}

/// Surface variants for walls and floors, in server numbering.
pub const WALL_VARIANTS: u32 = 2; // 0 concrete, 1 wood
pub const FLOOR_VARIANTS: u32 = 4; // 0 concrete, 1 wood, 2 carpet, 3 tile

/// A decoded tile code: category, optional surface variant, optional label.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DecodedTile {
    pub kind: TileKind,
    /// Surface variant for walls/floors when the suffix is a known number.
    pub variant: Option<u32>,
    /// First suffix character to overlay, for categories that carry ids.
    pub label: Option<char>,
}

impl TileKind {
    pub fn from_leading(c: char) -> TileKind {
        match c {
            '-' => TileKind::Empty,
            '#' => TileKind::Wall,
            ' ' => TileKind::Floor,
            '=' => TileKind::Door,
            '<' => TileKind::Keycard,
            '?' => TileKind::Special,
            'E' => TileKind::Enemy,
            '^' => TileKind::StairsUp,
            'v' => TileKind::StairsDown,
            '@' => TileKind::Landing,
            'c' => TileKind::Chest,
            'p' => TileKind::Powerup,
            '*' => TileKind::PlayerMark,
            _ => TileKind::Unknown,
        }
    }

    /// Does a numeric suffix select a surface variant for this category?
    fn has_variants(self) -> bool {
        matches!(self, TileKind::Wall | TileKind::Floor)
    }

    fn variant_count(self) -> u32 {
        match self {
            TileKind::Wall => WALL_VARIANTS,
            TileKind::Floor => FLOOR_VARIANTS,
            _ => 0,
        }
    }

    /// Fallback description, used when the server legend has no entry.
    pub fn describe(self) -> &'static str {
        match self {
            TileKind::Empty => "empty space",
            TileKind::Wall => "wall",
            TileKind::Floor => "floor",
            TileKind::Door => "door",
            TileKind::Keycard => "keycard",
            TileKind::Special => "interactable",
            TileKind::Enemy => "enemy",
            TileKind::StairsUp => "staircase up",
            TileKind::StairsDown => "staircase down",
            TileKind::Landing => "stair landing",
            TileKind::Chest => "chest",
            TileKind::Powerup => "powerup",
            TileKind::PlayerMark => "spawn marker",
            TileKind::Unknown => "unknown tile",
        }
    }
}

/// Decode a raw tile code. Total; never fails.
pub fn decode(code: &str) -> DecodedTile {
    let mut chars = code.chars();
    let kind = match chars.next() {
        Some(c) => TileKind::from_leading(c),
        None => TileKind::Unknown,
    };
    let suffix = chars.as_str();

    if suffix.is_empty() {
        return DecodedTile { kind, variant: None, label: None };
    }

    if kind.has_variants() {
        if let Ok(n) = suffix.parse::<u32>() {
            if n < kind.variant_count() {
                return DecodedTile { kind, variant: Some(n), label: None };
            }
        }
        // Out-of-range or non-numeric: category default.
        return DecodedTile { kind, variant: None, label: None };
    }

    DecodedTile { kind, variant: None, label: suffix.chars().next() }
}
