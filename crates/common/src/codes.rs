//! Numeric status codes carried in `OP_RESULT`, typed vector results, and
//! `ERROR` reply payloads.
//!
//! `SUCCESS` is the only code that suppresses an `ERROR` frame in favor of a
//! typed result; every other code rides back to the client alongside a
//! human-readable message.

/// Operation completed successfully.
pub const SUCCESS: u32 = 0;

/// The requested key does not exist in the table engine.
pub const KV_KEY_NOT_FOUND: u32 = 1;

/// The requested vector id does not exist in the index.
pub const VECTOR_ID_NOT_FOUND: u32 = 1;
/// Insert was attempted with an id that already exists in the index.
pub const VECTOR_ID_EXISTS: u32 = 2;
/// The supplied vector's dimensionality does not match the index.
pub const VECTOR_DIM_MISMATCH: u32 = 3;

/// A malformed or structurally invalid request reached the dispatcher.
pub const BAD_REQUEST: u32 = 100;

/// Catch-all for engine-internal failures (I/O, corruption) surfaced to a client.
pub const INTERNAL: u32 = 255;
