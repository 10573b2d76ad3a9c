/// Connection manager: keeps a live channel to the server state feed.
///
/// Lifecycle: `Connecting → Open → (messages)* → Closed → wait → Connecting`,
/// looping forever. Transport errors force the socket closed rather than
/// leaving it half-open. The retry policy is injected so tests run with zero
/// delay; the production policy is a fixed delay, unbounded attempts.
///
/// The socket is switched to non-blocking after the handshake so the
/// single-threaded client loop can poll it alongside keyboard input.
/// Outbound moves are best-effort: sent only while open, silently dropped
/// otherwise. No queueing; a move that waited out a reconnect is stale.

use std::io;
use std::net::TcpStream;
use std::time::{Duration, Instant};

use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use crate::domain::state::{GameState, MoveDir};

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Fixed-delay reconnect policy. No backoff growth, no attempt cap.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn fixed(delay: Duration) -> Self {
        RetryPolicy { delay }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LinkState {
    Connecting,
    Open,
    Closed,
}

impl LinkState {
    pub fn label(self) -> &'static str {
        match self {
            LinkState::Connecting => "connecting",
            LinkState::Open => "online",
            LinkState::Closed => "offline",
        }
    }
}

/// What a poll turned up. State payloads come pre-parsed; malformed frames
/// surface as `ParseError` and leave the caller's cached state alone.
#[derive(Debug)]
pub enum LinkEvent {
    Connected,
    State(GameState),
    ParseError,
    Dropped,
}

pub struct Connection {
    endpoint: String,
    retry: RetryPolicy,
    socket: Option<Socket>,
    state: LinkState,
    next_attempt: Instant,
    attempts: u64,
    parse_errors: u64,
}

/// Parse one inbound frame as the state payload.
pub fn parse_state(raw: &str) -> Result<GameState, serde_json::Error> {
    serde_json::from_str(raw)
}

/// The outbound move envelope, exactly as the server expects it.
pub fn move_envelope(dir: MoveDir) -> String {
    serde_json::json!({ "move": dir.token() }).to_string()
}

impl Connection {
    /// A connection that will dial `endpoint` on the first `poll`.
    pub fn new(endpoint: String, retry: RetryPolicy) -> Self {
        Connection {
            endpoint,
            retry,
            socket: None,
            state: LinkState::Closed,
            next_attempt: Instant::now(),
            attempts: 0,
            parse_errors: 0,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Connect attempts made so far (successful or not).
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Malformed inbound frames seen this session.
    pub fn parse_errors(&self) -> u64 {
        self.parse_errors
    }

    /// Drive the state machine one step: dial if due, then drain any
    /// inbound frames. Never blocks beyond the synchronous handshake.
    pub fn poll(&mut self) -> Vec<LinkEvent> {
        let mut events = Vec::new();

        if self.socket.is_none() {
            if Instant::now() >= self.next_attempt {
                self.dial(&mut events);
            }
            return events;
        }

        let mut lost = false;
        if let Some(sock) = self.socket.as_mut() {
            loop {
                match sock.read() {
                    Ok(Message::Text(raw)) => match parse_state(&raw) {
                        Ok(state) => events.push(LinkEvent::State(state)),
                        // Count and move on; the last good frame stays cached.
                        Err(_) => {
                            self.parse_errors += 1;
                            events.push(LinkEvent::ParseError);
                        }
                    },
                    Ok(Message::Close(_)) => {
                        lost = true;
                        break;
                    }
                    // Ping/pong/binary: transport noise, nothing to render.
                    Ok(_) => {}
                    Err(tungstenite::Error::Io(e)) if e.kind() == io::ErrorKind::WouldBlock => {
                        break;
                    }
                    Err(_) => {
                        lost = true;
                        break;
                    }
                }
            }
        }

        if lost {
            self.drop_link();
            events.push(LinkEvent::Dropped);
        }
        events
    }

    /// Forward one movement token. Only while open; dropped otherwise.
    pub fn send_move(&mut self, dir: MoveDir) {
        let mut lost = false;
        if let Some(sock) = self.socket.as_mut() {
            match sock.send(Message::Text(move_envelope(dir))) {
                Ok(()) => {}
                // Non-blocking socket not ready: the frame stays queued and
                // flushes on a later read/send.
                Err(tungstenite::Error::Io(e)) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(_) => lost = true,
            }
        }
        if lost {
            self.drop_link();
        }
    }

    fn dial(&mut self, events: &mut Vec<LinkEvent>) {
        self.attempts += 1;
        self.state = LinkState::Connecting;

        match tungstenite::connect(self.endpoint.as_str()) {
            Ok((mut sock, _response)) => {
                if set_nonblocking(&mut sock).is_err() {
                    self.schedule_retry();
                    return;
                }
                self.socket = Some(sock);
                self.state = LinkState::Open;
                events.push(LinkEvent::Connected);
            }
            Err(_) => self.schedule_retry(),
        }
    }

    fn drop_link(&mut self) {
        self.socket = None;
        self.schedule_retry();
    }

    fn schedule_retry(&mut self) {
        self.state = LinkState::Closed;
        self.next_attempt = Instant::now() + self.retry.delay;
    }
}

fn set_nonblocking(sock: &mut Socket) -> io::Result<()> {
    match sock.get_mut() {
        MaybeTlsStream::Plain(s) => s.set_nonblocking(true),
        MaybeTlsStream::NativeTls(s) => s.get_mut().set_nonblocking(true),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn zero_retry() -> RetryPolicy {
        RetryPolicy::fixed(Duration::ZERO)
    }

    /// A port that refuses connections: bind, read the port, drop the listener.
    fn refused_endpoint() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("ws://127.0.0.1:{port}")
    }

    #[test]
    fn move_envelope_matches_protocol() {
        assert_eq!(move_envelope(MoveDir::Up), r#"{"move":"w"}"#);
        assert_eq!(move_envelope(MoveDir::Left), r#"{"move":"a"}"#);
    }

    #[test]
    fn malformed_payload_is_an_error_not_a_panic() {
        assert!(parse_state("{not json").is_err());
        assert!(parse_state(r#"{"grid": "nope"}"#).is_err());
        assert!(parse_state(r##"{"grid": [["#"]]}"##).is_ok());
    }

    #[test]
    fn failed_dial_schedules_another_attempt() {
        let mut conn = Connection::new(refused_endpoint(), zero_retry());
        assert!(conn.poll().is_empty());
        assert_eq!(conn.state(), LinkState::Closed);
        assert_eq!(conn.attempts(), 1);

        // Zero-delay policy: the very next poll tries again. Indefinitely.
        let _ = conn.poll();
        let _ = conn.poll();
        assert_eq!(conn.attempts(), 3);
        assert_eq!(conn.state(), LinkState::Closed);
    }

    #[test]
    fn retry_waits_out_the_fixed_delay() {
        let mut conn = Connection::new(refused_endpoint(), RetryPolicy::fixed(Duration::from_secs(60)));
        let _ = conn.poll();
        assert_eq!(conn.attempts(), 1);
        // Delay not elapsed: no second attempt yet.
        let _ = conn.poll();
        assert_eq!(conn.attempts(), 1);
    }

    #[test]
    fn send_while_closed_is_silently_dropped() {
        let mut conn = Connection::new(refused_endpoint(), RetryPolicy::fixed(Duration::from_secs(60)));
        conn.send_move(MoveDir::Down); // no socket, no panic
        assert_eq!(conn.state(), LinkState::Closed);
    }

    #[test]
    fn receives_state_from_a_live_server() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut ws = tungstenite::accept(stream).unwrap();
            ws.send(Message::Text(
                r##"{"grid":[["#","-"],["-"," "]],"player":{"x":1,"y":1}}"##.into(),
            ))
            .unwrap();
            // Expect one move back, then hang up.
            loop {
                match ws.read() {
                    Ok(Message::Text(raw)) => return raw,
                    Ok(_) => continue,
                    Err(e) => panic!("server read failed: {e}"),
                }
            }
        });

        let mut conn = Connection::new(format!("ws://127.0.0.1:{port}"), zero_retry());

        let mut got_state = None;
        let deadline = Instant::now() + Duration::from_secs(5);
        while got_state.is_none() && Instant::now() < deadline {
            for ev in conn.poll() {
                if let LinkEvent::State(s) = ev {
                    got_state = Some(s);
                }
            }
            std::thread::sleep(Duration::from_millis(5));
        }

        let state = got_state.expect("no state before deadline");
        assert_eq!(state.rows(), 2);
        assert_eq!(state.player_cell(), Some((1, 1)));
        assert_eq!(conn.state(), LinkState::Open);

        conn.send_move(MoveDir::Up);
        let forwarded = server.join().unwrap();
        assert_eq!(forwarded, r#"{"move":"w"}"#);
    }

    #[test]
    fn server_hangup_drops_the_link_and_reschedules() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let ws = tungstenite::accept(stream).unwrap();
            drop(ws); // immediate hangup
        });

        let mut conn = Connection::new(format!("ws://127.0.0.1:{port}"), zero_retry());

        let mut dropped = false;
        let deadline = Instant::now() + Duration::from_secs(5);
        while !dropped && Instant::now() < deadline {
            for ev in conn.poll() {
                if matches!(ev, LinkEvent::Dropped) {
                    dropped = true;
                }
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        server.join().unwrap();

        assert!(dropped, "link never reported Dropped");
        assert_eq!(conn.state(), LinkState::Closed);
    }
}
