//! The connection multiplexer.
//!
//! Single-threaded cooperative multiplexing over `mio`'s level-triggered
//! readiness poll, mirroring `socket.c`'s `select`-based accept loop in the
//! source but generalized over [`MessageHandler`] so the exact same loop
//! drives both the vector and table servers. Up to
//! [`common::paths::MAX_CONNECTIONS`] clients are served concurrently; the
//! listener itself is always registered as one more readiness source.
//!
//! There is no pipelining: each connection holds at most one in-flight
//! request, enforced by [`Connection`] only reading a new frame once its
//! previous reply has finished sending.

use crate::dispatch::{MessageHandler, Reply};
use common::paths::MAX_CONNECTIONS;
use common::{VictordError, VictordResult};
use mio::net::{UnixListener, UnixStream};
use mio::{Events, Interest, Poll, Token};
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use wire::frame::{FrameAccumulator, FrameSender, Progress};

const LISTENER: Token = Token(0);
/// How often the loop wakes up with no readiness events, purely to recheck
/// the shutdown flag. Not a request timeout — a slow or idle client holds
/// its slot indefinitely otherwise (see the spec's concurrency model).
const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Continue,
    NeedWrite,
    Close,
}

struct Connection {
    stream: UnixStream,
    acc: FrameAccumulator,
    sender: Option<FrameSender>,
}

impl Connection {
    fn new(stream: UnixStream) -> Self {
        Self {
            stream,
            acc: FrameAccumulator::new(),
            sender: None,
        }
    }

    /// Try to complete one request/reply cycle: read a frame, dispatch it,
    /// start sending the reply. Returns `NeedWrite` if the reply didn't fit
    /// in one non-blocking write.
    fn on_readable(&mut self, handler: &mut dyn MessageHandler) -> Outcome {
        match self.acc.fill(&mut self.stream) {
            Ok(Progress::Pending) => Outcome::Continue,
            Ok(Progress::Complete) => {
                let frame = self.acc.take_frame();
                match handler.handle(frame.msg_type, &frame.payload, true) {
                    Reply::Close => Outcome::Close,
                    Reply::Frame(msg_type, payload) => self.start_reply(msg_type, &payload),
                }
            }
            Err(_) => Outcome::Close,
        }
    }

    fn start_reply(&mut self, msg_type: u8, payload: &[u8]) -> Outcome {
        let mut sender = match FrameSender::new(msg_type, payload) {
            Ok(sender) => sender,
            Err(_) => return Outcome::Close,
        };
        match sender.send(&mut self.stream) {
            Ok(Progress::Complete) => Outcome::Continue,
            Ok(Progress::Pending) => {
                self.sender = Some(sender);
                Outcome::NeedWrite
            }
            Err(_) => Outcome::Close,
        }
    }

    /// Resume a reply that previously hit `WouldBlock`.
    fn on_writable(&mut self) -> Outcome {
        let Some(sender) = self.sender.as_mut() else {
            return Outcome::Continue;
        };
        match sender.send(&mut self.stream) {
            Ok(Progress::Complete) => {
                self.sender = None;
                Outcome::Continue
            }
            Ok(Progress::Pending) => Outcome::NeedWrite,
            Err(_) => Outcome::Close,
        }
    }
}

/// Run the connection loop until `shutdown` is set.
///
/// Binds `socket_path` (removing any stale socket left by an unclean prior
/// exit), accepts up to `MAX_CONNECTIONS` concurrent clients, and drives
/// each through `handler` until the shutdown flag is observed between
/// iterations. On return, every connection and the listener have been
/// closed and `socket_path` has been unlinked.
pub fn run(
    socket_path: &Path,
    handler: &mut dyn MessageHandler,
    shutdown: Arc<AtomicBool>,
) -> VictordResult<()> {
    let _ = std::fs::remove_file(socket_path);
    let mut listener = UnixListener::bind(socket_path).map_err(VictordError::Io)?;

    let mut poll = Poll::new().map_err(VictordError::Io)?;
    poll.registry()
        .register(&mut listener, LISTENER, Interest::READABLE)
        .map_err(VictordError::Io)?;
    let mut events = Events::with_capacity(MAX_CONNECTIONS + 1);

    let mut connections: HashMap<Token, Connection> = HashMap::new();
    let mut next_token = 1usize;

    info!(socket = %socket_path.display(), "listening");

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        match poll.poll(&mut events, Some(POLL_INTERVAL)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(VictordError::Io(e)),
        }

        for event in events.iter() {
            if event.token() == LISTENER {
                accept_new_connections(&listener, &mut poll, &mut connections, &mut next_token);
                continue;
            }

            let token = event.token();
            let outcome = match connections.get_mut(&token) {
                Some(conn) => {
                    let mut outcome = Outcome::Continue;
                    if event.is_readable() && conn.sender.is_none() {
                        outcome = conn.on_readable(handler);
                    }
                    if matches!(outcome, Outcome::Continue) && event.is_writable() {
                        outcome = conn.on_writable();
                    }
                    outcome
                }
                None => continue,
            };

            match outcome {
                Outcome::Continue => {}
                Outcome::NeedWrite => {
                    if let Some(conn) = connections.get_mut(&token) {
                        let _ = poll
                            .registry()
                            .reregister(&mut conn.stream, token, Interest::WRITABLE);
                    }
                }
                Outcome::Close => {
                    if let Some(mut conn) = connections.remove(&token) {
                        let _ = poll.registry().deregister(&mut conn.stream);
                    }
                }
            }

            // A reply that completed while WRITABLE interest was armed
            // needs to go back to waiting for the next request.
            if outcome == Outcome::Continue {
                if let Some(conn) = connections.get_mut(&token) {
                    if conn.sender.is_none() {
                        let _ = poll
                            .registry()
                            .reregister(&mut conn.stream, token, Interest::READABLE);
                    }
                }
            }
        }
    }

    for (_, mut conn) in connections.drain() {
        let _ = poll.registry().deregister(&mut conn.stream);
    }
    let _ = poll.registry().deregister(&mut listener);
    drop(listener);
    let _ = std::fs::remove_file(socket_path);
    info!("shutdown complete");
    Ok(())
}

fn accept_new_connections(
    listener: &UnixListener,
    poll: &mut Poll,
    connections: &mut HashMap<Token, Connection>,
    next_token: &mut usize,
) {
    loop {
        match listener.accept() {
            Ok((mut stream, _addr)) => {
                if connections.len() >= MAX_CONNECTIONS {
                    warn!(
                        max = MAX_CONNECTIONS,
                        "connection cap reached, closing new client immediately"
                    );
                    drop(stream);
                    continue;
                }
                let token = Token(*next_token);
                *next_token += 1;
                if poll
                    .registry()
                    .register(&mut stream, token, Interest::READABLE)
                    .is_ok()
                {
                    connections.insert(token, Connection::new(stream));
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) => {
                warn!(error = %e, "accept failed");
                break;
            }
        }
    }
}
