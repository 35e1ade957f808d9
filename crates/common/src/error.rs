use std::io;
use thiserror::Error;

/// Canonical error type shared across the vector and table servers.
///
/// Mirrors the taxonomy in the design notes: protocol violations close a
/// connection outright, engine errors become a reply, and startup/config
/// errors abort the process before it ever accepts a connection.
#[derive(Error, Debug)]
pub enum VictordError {
    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("codec: {0}")]
    Codec(String),

    #[error("engine: {0}")]
    Engine(String),

    #[error("wal: {0}")]
    Wal(String),

    #[error("config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias that carries a [`VictordError`].
pub type VictordResult<T> = Result<T, VictordError>;
