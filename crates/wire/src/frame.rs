//! 4-byte header + CBOR payload framing.
//!
//! A frame is `4 + N` bytes: a big-endian `u32` header packing a 4-bit type
//! and a 28-bit length, followed by `N` payload bytes. The same framing is
//! used on the wire and in the write-ahead log, so [`FrameAccumulator`] and
//! [`FrameSender`] are written against the generic [`std::io::Read`] /
//! [`std::io::Write`] traits and reused by both `wal` (blocking file I/O)
//! and the server's connection loop (non-blocking socket I/O).

use std::io::{self, Read, Write};
use thiserror::Error;

/// Largest payload length representable in the 28-bit length field.
pub const MAX_PAYLOAD_LEN: u32 = (1 << 28) - 1;

/// Largest message type representable in the 4-bit type field.
pub const MAX_MSG_TYPE: u8 = 15;

/// A fully-read frame: a raw message type and its undecoded CBOR payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub msg_type: u8,
    pub payload: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("message type {0} exceeds the 4-bit range (0-15)")]
    TypeOutOfRange(u8),
    #[error("payload length {0} exceeds the 28-bit range (0-{MAX_PAYLOAD_LEN})")]
    LenOutOfRange(u32),
    /// Clean end-of-stream at a frame boundary: not an error for a WAL
    /// reader ("no more entries"), and a plain disconnect for a connection.
    #[error("clean end of stream at frame boundary")]
    Eof,
    #[error("short read: expected {expected} more bytes, stream ended after {got}")]
    ShortRead { expected: usize, got: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Pack a message type and payload length into the 4-byte big-endian header.
///
/// Fails if `msg_type > 15` or `len > 2^28 - 1`; the caller must not submit
/// an out-of-range header to the wire.
pub fn encode_header(msg_type: u8, len: u32) -> Result<[u8; 4], FrameError> {
    if msg_type > MAX_MSG_TYPE {
        return Err(FrameError::TypeOutOfRange(msg_type));
    }
    if len > MAX_PAYLOAD_LEN {
        return Err(FrameError::LenOutOfRange(len));
    }
    let word = ((msg_type as u32) << 28) | len;
    Ok(word.to_be_bytes())
}

/// Unpack a 4-byte big-endian header into `(msg_type, len)`.
///
/// Always succeeds: the bit layout guarantees `msg_type <= 15` and
/// `len <= 2^28 - 1` for any 4 input bytes.
pub fn decode_header(bytes: [u8; 4]) -> (u8, u32) {
    let word = u32::from_be_bytes(bytes);
    (((word >> 28) & 0x0F) as u8, word & MAX_PAYLOAD_LEN)
}

/// Outcome of one non-blocking attempt to make progress on a frame.
#[derive(Debug, PartialEq, Eq)]
pub enum Progress {
    /// The frame (or write) is not yet complete; the underlying stream
    /// would block. The caller should wait for the next readiness event.
    Pending,
    /// The frame was fully read or written.
    Complete,
}

/// Incremental frame reader.
///
/// Feed it a stream via [`fill`](Self::fill) as many times as needed; it
/// resumes exactly where the last call left off, so it is safe to use
/// against a non-blocking socket that only yields a few bytes per
/// readiness event.
#[derive(Debug)]
pub struct FrameAccumulator {
    header: [u8; 4],
    header_filled: usize,
    msg_type: u8,
    payload_len: u32,
    payload: Vec<u8>,
    payload_filled: usize,
    header_done: bool,
}

impl Default for FrameAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAccumulator {
    pub fn new() -> Self {
        Self {
            header: [0u8; 4],
            header_filled: 0,
            msg_type: 0,
            payload_len: 0,
            payload: Vec::new(),
            payload_filled: 0,
            header_done: false,
        }
    }

    /// Read as much of the frame as is immediately available from `r`.
    ///
    /// Returns `Ok(Progress::Complete)` once the whole frame has arrived
    /// (retrieve it with [`take_frame`](Self::take_frame)), `Ok(Progress::Pending)`
    /// if the stream would block before that, `Err(FrameError::Eof)` if the
    /// stream closed cleanly before any byte of this frame arrived, or
    /// another `FrameError` for a short/corrupt read or I/O failure.
    pub fn fill<R: Read>(&mut self, r: &mut R) -> Result<Progress, FrameError> {
        if !self.header_done {
            loop {
                match r.read(&mut self.header[self.header_filled..4]) {
                    Ok(0) => {
                        return if self.header_filled == 0 {
                            Err(FrameError::Eof)
                        } else {
                            Err(FrameError::ShortRead {
                                expected: 4,
                                got: self.header_filled,
                            })
                        };
                    }
                    Ok(n) => {
                        self.header_filled += n;
                        if self.header_filled == 4 {
                            let (msg_type, len) = decode_header(self.header);
                            self.msg_type = msg_type;
                            self.payload_len = len;
                            self.payload = vec![0u8; len as usize];
                            self.header_done = true;
                            break;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(Progress::Pending),
                    Err(e) => return Err(e.into()),
                }
            }
        }

        while self.payload_filled < self.payload.len() {
            match r.read(&mut self.payload[self.payload_filled..]) {
                Ok(0) => {
                    return Err(FrameError::ShortRead {
                        expected: self.payload.len(),
                        got: self.payload_filled,
                    });
                }
                Ok(n) => self.payload_filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(Progress::Pending),
                Err(e) => return Err(e.into()),
            }
        }

        Ok(Progress::Complete)
    }

    /// Take the completed frame and reset the accumulator for reuse.
    ///
    /// Panics if called before [`fill`](Self::fill) reported
    /// [`Progress::Complete`].
    pub fn take_frame(&mut self) -> Frame {
        assert!(
            self.header_done && self.payload_filled == self.payload.len(),
            "take_frame called before the frame was complete"
        );
        let frame = Frame {
            msg_type: self.msg_type,
            payload: std::mem::take(&mut self.payload),
        };
        self.header_filled = 0;
        self.header_done = false;
        self.payload_filled = 0;
        frame
    }
}

/// Incremental frame writer, symmetric to [`FrameAccumulator`].
#[derive(Debug)]
pub struct FrameSender {
    buf: Vec<u8>,
    written: usize,
}

impl FrameSender {
    pub fn new(msg_type: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let len = u32::try_from(payload.len()).map_err(|_| FrameError::LenOutOfRange(u32::MAX))?;
        let header = encode_header(msg_type, len)?;
        let mut buf = Vec::with_capacity(4 + payload.len());
        buf.extend_from_slice(&header);
        buf.extend_from_slice(payload);
        Ok(Self { buf, written: 0 })
    }

    /// Write as much of the frame as the stream will currently accept.
    pub fn send<W: Write>(&mut self, w: &mut W) -> Result<Progress, FrameError> {
        while self.written < self.buf.len() {
            match w.write(&self.buf[self.written..]) {
                Ok(0) => {
                    return Err(FrameError::ShortRead {
                        expected: self.buf.len(),
                        got: self.written,
                    });
                }
                Ok(n) => self.written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(Progress::Pending),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(Progress::Complete)
    }
}

/// Read one complete frame from a blocking stream (a WAL file, or a test
/// harness's blocking socket).
///
/// Returns `Ok(None)` on a clean end-of-stream at a frame boundary,
/// `Ok(Some(frame))` on success, and `Err` for a short/corrupt frame or I/O
/// failure.
pub fn read_frame_blocking<R: Read>(r: &mut R) -> Result<Option<Frame>, FrameError> {
    let mut acc = FrameAccumulator::new();
    loop {
        match acc.fill(r) {
            Ok(Progress::Complete) => return Ok(Some(acc.take_frame())),
            Ok(Progress::Pending) => continue,
            Err(FrameError::Eof) => return Ok(None),
            Err(e) => return Err(e),
        }
    }
}

/// Write one complete frame to a blocking stream.
pub fn write_frame_blocking<W: Write>(
    w: &mut W,
    msg_type: u8,
    payload: &[u8],
) -> Result<(), FrameError> {
    let mut sender = FrameSender::new(msg_type, payload)?;
    loop {
        match sender.send(w)? {
            Progress::Complete => return Ok(()),
            Progress::Pending => continue,
        }
    }
}
