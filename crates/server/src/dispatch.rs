//! The generic request/reply/WAL-append pipeline shared by both engines.
//!
//! The source has two near-identical dispatch tables, one per engine
//! (`viproto.c`'s vector handlers, `kvproto.c`'s table handlers): decode a
//! request, call into the engine, optionally append the original request
//! frame to the WAL, encode a reply. [`MessageHandler`] is the seam that
//! factors this into one generic pipeline (see the redesign note in
//! `DESIGN.md`): [`crate::vector_session::VectorSession`] and
//! [`crate::table_session::TableSession`] each implement it with their own
//! decode/engine-call/encode logic, and [`crate::conn`] drives either one
//! through the exact same connection loop.

use wire::msg;

/// What the connection loop should do after handling one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Send this `(msg_type, payload)` frame back to the client and keep
    /// the connection open for the next request.
    Frame(u8, Vec<u8>),
    /// The frame was a protocol violation (bad CBOR or an unknown message
    /// type); close the connection without replying.
    Close,
}

/// One engine's request handler: decode by type, call the engine, encode a
/// reply, and report whether the original frame should be appended to the
/// WAL.
///
/// Implementations are driven twice: live, by [`crate::conn`]'s connection
/// loop (`record = true`), and at startup during WAL replay (`record =
/// false`, see [`crate::startup`]) — the same decode/engine-call/encode path
/// runs either way, which is the property the spec calls out as the replay
/// invariant.
pub trait MessageHandler {
    /// Handle one request frame, returning the reply to send (or
    /// [`Reply::Close`] for a protocol violation).
    ///
    /// When `record` is true and the request was a mutating op that
    /// succeeded, implementations append the original frame to their WAL
    /// and run the snapshot-threshold check; WAL replay passes `record =
    /// false` so replayed entries are not re-appended to the log they came
    /// from.
    fn handle(&mut self, msg_type: u8, payload: &[u8], record: bool) -> Reply;
}

/// Build a `Reply::Frame` for a status/ack reply (`OP_RESULT`, typed vector
/// results, or `ERROR`).
pub fn status_reply(reply_type: u8, code: u32, message: &str) -> Reply {
    match wire::codec::encode_status(code, message) {
        Ok(payload) => Reply::Frame(reply_type, payload),
        Err(_) => Reply::Close,
    }
}

/// `Reply::Frame` for a successful ack, using the generic `OP_RESULT`/typed
/// success encoding (`code = 0`, empty message).
pub fn ok_reply(reply_type: u8) -> Reply {
    status_reply(reply_type, common::codes::SUCCESS, "")
}

/// `Reply::Frame` carrying an `ERROR` frame for a non-zero engine status.
pub fn error_reply(code: u32, message: &str) -> Reply {
    status_reply(msg::ERROR, code, message)
}
