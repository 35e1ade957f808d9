//! Shared skeleton for the VictorDB vector and table servers: wire framing
//! lives in `wire`, persistence in `wal`/`engine`, and this crate supplies
//! the pieces in between — configuration, the generic dispatch pipeline,
//! per-engine sessions, startup/replay, the connection multiplexer, and
//! signal-driven shutdown.
//!
//! The two binaries in `src/bin/` each wire these modules together for one
//! engine; see `DESIGN.md` for how the vector and table servers share this
//! skeleton.

pub mod conn;
pub mod config;
pub mod dispatch;
pub mod logging;
pub mod signals;
pub mod snapshot;
pub mod startup;
pub mod table_session;
pub mod vector_session;

#[cfg(test)]
mod tests;
