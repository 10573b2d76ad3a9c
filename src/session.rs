/// Client session: every piece of shared mutable state in one place.
///
/// Cached server state, legend, facing, pause flag, theme, link status —
/// all owned here and only ever touched from the single event-loop thread.
/// Rendering is receive-driven: a dirty flag is raised by anything that
/// changes what the screen should show, and the loop composes a frame only
/// when it is set (plus a redraw on resize, handled by the renderer).

use std::collections::HashMap;

use crate::domain::state::{Facing, GameState};
use crate::net::connection::LinkState;
use crate::ui::camera::Camera;
use crate::ui::theme::Theme;

/// Which top-level screen the client is on.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Screen {
    Menu,
    Game,
}

/// Menu entries, in display order.
pub const MENU_ITEMS: &[&str] = &["Enter the Crawl", "Toggle Day/Night", "Quit"];

pub struct Session {
    /// Last good state from the server. Replaced wholesale, never mutated.
    pub state: Option<GameState>,
    /// Legend cached across messages; entries merge in, omission changes nothing.
    pub legend: HashMap<String, String>,
    /// Last server broadcast line.
    pub server_message: String,

    pub facing: Facing,
    pub paused: bool,
    pub theme: Theme,

    pub screen: Screen,
    pub menu_cursor: usize,

    /// Mirror of the connection state, for the HUD.
    pub link: LinkState,
    pub parse_errors: u64,

    pub camera: Camera,

    dirty: bool,
}

impl Session {
    pub fn new(theme: Theme) -> Self {
        Session {
            state: None,
            legend: HashMap::new(),
            server_message: String::new(),
            facing: Facing::Up,
            paused: false,
            theme,
            screen: Screen::Menu,
            menu_cursor: 0,
            link: LinkState::Closed,
            parse_errors: 0,
            camera: Camera::new(),
            dirty: true,
        }
    }

    /// Absorb one server state push. Legend and message only update when
    /// present; the grid/player cache is swapped for the new payload.
    pub fn apply_state(&mut self, incoming: GameState) {
        if let Some(tiles) = &incoming.basic_tiles {
            for (code, value) in tiles {
                self.legend.insert(code.clone(), stringify_legend(value));
            }
        }
        if let Some(msg) = &incoming.message {
            self.server_message = msg.clone();
        }
        self.state = Some(incoming);
        self.touch();
    }

    /// Legend description for a tile code, if the server supplied one.
    pub fn describe(&self, code: &str) -> Option<&str> {
        self.legend.get(code).map(|s| s.as_str())
    }

    pub fn set_link(&mut self, link: LinkState) {
        if self.link != link {
            self.link = link;
            self.touch();
        }
    }

    pub fn set_facing(&mut self, facing: Facing) {
        if self.facing != facing {
            self.facing = facing;
            self.touch();
        }
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        self.touch();
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        self.touch();
    }

    pub fn touch(&mut self) {
        self.dirty = true;
    }

    /// Consume the dirty flag; true means a frame should be composed.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

/// Legend values are descriptions in the documented protocol, but real
/// servers send arrays and numbers too. Render whatever arrived.
fn stringify_legend(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::connection::parse_state;

    fn push(sess: &mut Session, raw: &str) {
        sess.apply_state(parse_state(raw).unwrap());
    }

    #[test]
    fn state_swap_caches_grid_and_player() {
        let mut sess = Session::new(Theme::Night);
        push(&mut sess, r##"{"grid":[["#","-"],["-"," "]],"player":{"x":1,"y":1}}"##);
        let s = sess.state.as_ref().unwrap();
        assert_eq!(s.rows(), 2);
        assert_eq!(s.player_cell(), Some((1, 1)));
        assert!(sess.take_dirty());
        assert!(!sess.take_dirty());
    }

    #[test]
    fn legend_persists_when_later_messages_omit_it() {
        let mut sess = Session::new(Theme::Night);
        push(&mut sess, r##"{"grid":[[" "]],"basic_tiles":{"#":"wall","c":"chest"}}"##);
        push(&mut sess, r##"{"grid":[["#"]]}"##);
        assert_eq!(sess.describe("#"), Some("wall"));
        assert_eq!(sess.describe("c"), Some("chest"));
    }

    #[test]
    fn legend_entries_merge_not_replace() {
        let mut sess = Session::new(Theme::Night);
        push(&mut sess, r##"{"grid":[[" "]],"basic_tiles":{"#":"wall"}}"##);
        push(&mut sess, r#"{"grid":[[" "]],"basic_tiles":{"=":"door"}}"#);
        assert_eq!(sess.describe("#"), Some("wall"));
        assert_eq!(sess.describe("="), Some("door"));
    }

    #[test]
    fn non_string_legend_values_are_stringified() {
        let mut sess = Session::new(Theme::Night);
        push(&mut sess, r##"{"grid":[[" "]],"basic_tiles":{"#":["wall",1]}}"##);
        assert_eq!(sess.describe("#"), Some(r#"["wall",1]"#));
    }

    #[test]
    fn malformed_payload_leaves_cache_untouched() {
        let mut sess = Session::new(Theme::Night);
        push(&mut sess, r##"{"grid":[["#","-"],["-"," "]],"player":{"x":1,"y":1}}"##);
        let _ = sess.take_dirty();

        // The connection layer rejects this before apply_state ever runs.
        assert!(parse_state("{not json").is_err());

        let s = sess.state.as_ref().unwrap();
        assert_eq!(s.player_cell(), Some((1, 1)));
        assert_eq!(s.rows(), 2);
        assert!(!sess.take_dirty());
    }

    #[test]
    fn message_survives_omission() {
        let mut sess = Session::new(Theme::Night);
        push(&mut sess, r#"{"grid":[[" "]],"message":"found a key"}"#);
        push(&mut sess, r#"{"grid":[[" "]]}"#);
        assert_eq!(sess.server_message, "found a key");
    }
}
