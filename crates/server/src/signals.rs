//! Signal-driven shutdown flag.
//!
//! `SIGINT`, `SIGTERM`, and `SIGHUP` all request a clean shutdown. The
//! handlers installed here touch nothing but an async-signal-safe atomic
//! flag (this is exactly what `signal_hook::flag::register` does under the
//! hood); the connection loop polls it between iterations and exits once it
//! is set, then tears down its resources in order.

use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::flag;
use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Register `SIGINT`/`SIGTERM`/`SIGHUP` handlers that set `flag` to `true`.
///
/// Returns the shared flag; the caller checks it at loop iteration
/// boundaries. Registration failure is a startup error.
pub fn install() -> io::Result<Arc<AtomicBool>> {
    let shutdown = Arc::new(AtomicBool::new(false));
    flag::register(SIGINT, Arc::clone(&shutdown))?;
    flag::register(SIGTERM, Arc::clone(&shutdown))?;
    flag::register(SIGHUP, Arc::clone(&shutdown))?;
    Ok(shutdown)
}
