//! Structured logging setup.
//!
//! The source logs through a tiny `fprintf`-based `log_message(level, fmt,
//! ...)` helper (`log.c`) that stamps every line with a timestamp, level, and
//! pid. `tracing` is the ecosystem's version of that idea — initialized once
//! at startup, it gives every warning the dispatcher and WAL/snapshot layers
//! emit the same timestamped, leveled shape for free, controllable via
//! `RUST_LOG`.

/// Install the global `tracing` subscriber. Call once, at the top of `main`.
pub fn init() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .ok();
}
