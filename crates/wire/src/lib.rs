//! Wire protocol for the VictorDB vector and table servers.
//!
//! A message on the wire (or in a WAL file) is a [`frame::Frame`]: a 4-byte
//! big-endian header packing a 4-bit [`msg`] type and a 28-bit length,
//! followed by that many bytes of CBOR. [`frame`] handles the header and
//! raw byte transport; [`codec`] handles the typed CBOR payloads.

pub mod codec;
pub mod frame;
pub mod msg;

#[cfg(test)]
mod tests;

pub use codec::{CodecError, CodecResult};
pub use frame::{Frame, FrameAccumulator, FrameError, FrameSender, Progress};
