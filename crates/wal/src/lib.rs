//! Write-ahead log for the vector and table engines.
//!
//! A WAL file is a concatenation of complete frames, written with the exact
//! same framing used on the wire (see `wire::frame`). It stores only the
//! request side of mutating operations — `INSERT`/`DELETE` for the vector
//! engine, `PUT`/`DEL` for the table engine — in the order the dispatcher
//! applied them. Replay reuses that ordering and hands each frame back to
//! the caller one at a time so it can be pushed through the same dispatch
//! path used for live traffic, with WAL-append suppressed.
//!
//! # Example
//!
//! ```no_run
//! use wal::Wal;
//!
//! let mut log = Wal::open("db.twal").unwrap();
//! log.append(8, b"\x82\x43key\x43val").unwrap();
//!
//! let mut replayed = 0;
//! wal::replay("db.twal", |_frame| replayed += 1).unwrap();
//! ```

#[cfg(test)]
mod tests;

use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;
use wire::frame::{self, Frame, FrameError};

#[derive(Debug, Error)]
pub enum WalError {
    #[error("failed to open WAL file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to append to WAL: {0}")]
    Append(String),

    #[error("failed to sync WAL: {0}")]
    Sync(String),

    #[error("failed to truncate WAL: {0}")]
    Truncate(String),

    #[error("WAL corrupt: {0}")]
    Corrupt(String),

    #[error("I/O error reading WAL: {0}")]
    Io(String),
}

pub type WalResult<T> = Result<T, WalError>;

/// Append-only write-ahead log handle, opened once per server process.
#[derive(Debug)]
pub struct Wal {
    path: PathBuf,
    file: File,
}

impl Wal {
    /// Open or create the WAL file at `path` in append mode.
    pub fn open(path: impl AsRef<Path>) -> WalResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|source| WalError::Open {
                path: path.clone(),
                source,
            })?;
        Ok(Self { path, file })
    }

    /// Append one frame (the exact request that was just applied) to the log.
    ///
    /// A failure here is reported to the caller but does not mean the
    /// request itself failed — the engine call already succeeded by the
    /// time this runs, and the server logs a warning rather than rolling
    /// back a response that already went out.
    pub fn append(&mut self, msg_type: u8, payload: &[u8]) -> WalResult<()> {
        frame::write_frame_blocking(&mut self.file, msg_type, payload)
            .map_err(|e| WalError::Append(e.to_string()))
    }

    /// Fsync the WAL so appended frames survive a crash.
    pub fn sync(&mut self) -> WalResult<()> {
        self.file.sync_all().map_err(|e| WalError::Sync(e.to_string()))
    }

    /// Truncate the WAL to zero length after a successful snapshot export,
    /// then reopen it in append mode for further writes.
    pub fn truncate(&mut self) -> WalResult<()> {
        drop(std::mem::replace(
            &mut self.file,
            OpenOptions::new()
                .write(true)
                .truncate(true)
                .open(&self.path)
                .map_err(|e| WalError::Truncate(e.to_string()))?,
        ));

        self.file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| WalError::Truncate(e.to_string()))?;
        Ok(())
    }

    /// Remove the WAL file entirely. A missing file is not an error.
    pub fn unlink(path: impl AsRef<Path>) -> io::Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Replay all entries in the WAL file at `path`, calling `apply` once per
/// frame in file order.
///
/// A missing WAL file replays zero entries (a fresh database, or one that
/// has never had a WAL, behaves the same as an empty one). Returns the
/// number of frames applied. A short/corrupt frame mid-file is reported as
/// [`WalError::Corrupt`]; any other I/O failure as [`WalError::Io`].
pub fn replay<F>(path: impl AsRef<Path>, mut apply: F) -> WalResult<u64>
where
    F: FnMut(Frame),
{
    let path = path.as_ref();
    let mut file = match OpenOptions::new().read(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(source) => {
            return Err(WalError::Open {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    file.seek(SeekFrom::Start(0))
        .map_err(|e| WalError::Io(e.to_string()))?;

    let mut count = 0u64;
    loop {
        match frame::read_frame_blocking(&mut file) {
            Ok(Some(frame)) => {
                apply(frame);
                count += 1;
            }
            Ok(None) => break,
            Err(FrameError::ShortRead { expected, got }) => {
                return Err(WalError::Corrupt(format!(
                    "{}: truncated mid-frame after {} entries (expected {} more bytes, got {})",
                    path.display(),
                    count,
                    expected,
                    got
                )));
            }
            Err(FrameError::Io(e)) => return Err(WalError::Io(e.to_string())),
            Err(e) => return Err(WalError::Corrupt(e.to_string())),
        }
    }
    Ok(count)
}
