//! Shared error types, path/env resolution, and status codes for the
//! VictorDB vector and table servers.
//!
//! Both server binaries, and every crate they depend on, link against this
//! crate for the things that aren't specific to one engine: the error
//! taxonomy (protocol vs. engine vs. startup failures), the `<root>/<name>`
//! directory layout, and the numeric status codes carried in `OP_RESULT` /
//! `ERROR` replies.

pub mod codes;
mod error;
pub mod paths;

#[cfg(test)]
mod tests;

pub use error::{VictordError, VictordResult};
