/// Entry point and client loop.

mod config;
mod domain;
mod net;
mod session;
mod ui;

use std::time::Duration;

use crossterm::event::KeyCode;

use config::ClientConfig;
use net::connection::{Connection, LinkEvent, RetryPolicy};
use session::{Screen, Session, MENU_ITEMS};
use ui::input::{self, InputState};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;
use ui::theme;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let cfg = ClientConfig::load();
    let mut sess = Session::new(theme::load_theme());

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init(sess.theme) {
        // Wrong environment (no tty, dumb terminal): abort gracefully.
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();
    let mut conn = Connection::new(
        cfg.server.endpoint(),
        RetryPolicy::fixed(cfg.server.retry_delay()),
    );

    let result = client_loop(&mut sess, &mut renderer, &mut conn, sound.as_ref(), &cfg);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Client error: {e}");
    }

    theme::store_theme(sess.theme);
    println!();
    println!("Left the crawl. Server was {}.", cfg.server.endpoint());
}

fn client_loop(
    sess: &mut Session,
    renderer: &mut Renderer,
    conn: &mut Connection,
    sound: Option<&SoundEngine>,
    cfg: &ClientConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_keys(sess, &kb, conn, sound) {
            break;
        }

        // Drive the link even on the menu screen so its status stays live
        // and the first state is already cached when the game opens.
        for ev in conn.poll() {
            match ev {
                LinkEvent::Connected => {
                    if let Some(sfx) = sound {
                        sfx.play_link_up();
                    }
                }
                LinkEvent::State(state) => sess.apply_state(state),
                LinkEvent::ParseError => {
                    sess.parse_errors = conn.parse_errors();
                    sess.touch();
                }
                LinkEvent::Dropped => {
                    if let Some(sfx) = sound {
                        sfx.play_link_down();
                    }
                }
            }
        }
        sess.set_link(conn.state());

        // Receive-driven rendering: compose only when something changed,
        // plus a forced redraw when the terminal was resized.
        if sess.take_dirty() || renderer.size_changed() {
            renderer.render(sess, &cfg.vision)?;
        }

        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Handle one frame of key input. Returns true to quit.
fn handle_keys(
    sess: &mut Session,
    kb: &InputState,
    conn: &mut Connection,
    sound: Option<&SoundEngine>,
) -> bool {
    match sess.screen {
        // ── Menu ──
        Screen::Menu => {
            if kb.any_pressed(&[KeyCode::Up]) && sess.menu_cursor > 0 {
                sess.menu_cursor -= 1;
                sess.touch();
            } else if kb.any_pressed(&[KeyCode::Down]) && sess.menu_cursor + 1 < MENU_ITEMS.len()
            {
                sess.menu_cursor += 1;
                sess.touch();
            } else if kb.any_pressed(&[KeyCode::Enter, KeyCode::Char(' ')]) {
                match sess.menu_cursor {
                    0 => {
                        sess.screen = Screen::Game;
                        sess.touch();
                    }
                    1 => {
                        sess.toggle_theme();
                        theme::store_theme(sess.theme);
                    }
                    _ => return true,
                }
            } else if kb.any_pressed(&[KeyCode::Char('t'), KeyCode::Char('T')]) {
                sess.toggle_theme();
                theme::store_theme(sess.theme);
            } else if kb.any_pressed(&[KeyCode::Char('q'), KeyCode::Char('Q'), KeyCode::Esc]) {
                return true;
            }
        }

        // ── Game ──
        Screen::Game => {
            if kb.any_pressed(&[KeyCode::Esc]) {
                sess.screen = Screen::Menu;
                sess.paused = false;
                sess.touch();
                return false;
            }
            if kb.any_pressed(&[KeyCode::F(1)]) {
                sess.toggle_pause();
                return false;
            }
            if kb.any_pressed(&[KeyCode::Char('t'), KeyCode::Char('T')]) {
                sess.toggle_theme();
                theme::store_theme(sess.theme);
                return false;
            }

            // Movement: facing updates on every press; the send itself is
            // suppressed while paused and best-effort otherwise.
            if let Some(dir) = input::pressed_move(kb) {
                sess.set_facing(dir.facing());
                if !sess.paused {
                    conn.send_move(dir);
                    if let Some(sfx) = sound {
                        sfx.play_move();
                    }
                }
            }
        }
    }

    false
}
