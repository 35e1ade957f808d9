//! Database root resolution and per-database working directory setup.
//!
//! Grounded in the source implementation's `fileutils.h`: a process-global
//! root (`VICTOR_DB_ROOT`, falling back to `/var/lib/victord`) holds one
//! directory per database name. The server `chdir`s into that directory at
//! startup so every later file operation (snapshot, WAL, socket) can use a
//! plain relative name.

use crate::error::{VictordError, VictordResult};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the database root directory.
pub const DB_ROOT_ENV: &str = "VICTOR_DB_ROOT";

/// Compiled-in fallback root when `DB_ROOT_ENV` is unset.
pub const DEFAULT_DB_ROOT: &str = "/var/lib/victord";

/// Environment variable overriding the snapshot-export operation threshold.
pub const EXPORT_THRESHOLD_ENV: &str = "VICTOR_EXPORT_THRESHOLD";

/// Default number of mutating operations between snapshot flushes.
pub const DEFAULT_EXPORT_THRESHOLD: u64 = 10;

/// Hard cap on concurrent client connections per server process.
pub const MAX_CONNECTIONS: usize = 128;

/// Vector engine snapshot filename, relative to the database directory.
pub const INDEX_FILE: &str = "db.index";
/// Vector engine WAL filename, relative to the database directory.
pub const IWAL_FILE: &str = "db.iwal";
/// Table engine snapshot filename, relative to the database directory.
pub const TABLE_FILE: &str = "db.table";
/// Table engine WAL filename, relative to the database directory.
pub const TWAL_FILE: &str = "db.twal";
/// Default UNIX socket filename, relative to the database directory.
pub const SOCKET_FILE: &str = "socket.unix";

/// Resolve the database root directory: `VICTOR_DB_ROOT` if set, else the
/// compiled-in default.
pub fn db_root() -> PathBuf {
    match env::var_os(DB_ROOT_ENV) {
        Some(val) if !val.is_empty() => PathBuf::from(val),
        _ => PathBuf::from(DEFAULT_DB_ROOT),
    }
}

/// Resolve the snapshot-export operation threshold from `VICTOR_EXPORT_THRESHOLD`.
///
/// A missing, empty, zero, or unparsable value falls back to
/// [`DEFAULT_EXPORT_THRESHOLD`]; the caller is expected to log a warning in
/// that case via [`export_threshold_with_warning`].
pub fn export_threshold() -> u64 {
    export_threshold_with_warning().0
}

/// Like [`export_threshold`], but also reports whether the environment value
/// was rejected (and why) so the caller can log it.
pub fn export_threshold_with_warning() -> (u64, Option<String>) {
    match env::var(EXPORT_THRESHOLD_ENV) {
        Ok(val) => match val.parse::<u64>() {
            Ok(n) if n > 0 => (n, None),
            Ok(_) => (
                DEFAULT_EXPORT_THRESHOLD,
                Some(format!("{EXPORT_THRESHOLD_ENV} must be positive, got {val}")),
            ),
            Err(_) => (
                DEFAULT_EXPORT_THRESHOLD,
                Some(format!("{EXPORT_THRESHOLD_ENV} is not a valid integer: {val}")),
            ),
        },
        Err(_) => (DEFAULT_EXPORT_THRESHOLD, None),
    }
}

/// Create (if missing) and return `<root>/<name>`, the working directory for
/// one database.
///
/// Fails if the path exists but is not a directory. The directory is created
/// with mode `0700` on unix.
pub fn resolve_db_dir(root: &Path, name: &str) -> VictordResult<PathBuf> {
    let dir = root.join(name);
    match std::fs::metadata(&dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(VictordError::Config(format!(
                "{} exists and is not a directory",
                dir.display()
            )));
        }
        Err(_) => {
            create_dir(&dir)?;
        }
    }
    Ok(dir)
}

#[cfg(unix)]
fn create_dir(dir: &Path) -> VictordResult<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)
        .map_err(VictordError::Io)
}

#[cfg(not(unix))]
fn create_dir(dir: &Path) -> VictordResult<()> {
    std::fs::create_dir_all(dir).map_err(VictordError::Io)
}

/// Change the process working directory to `dir` so all subsequent relative
/// file operations (snapshot, WAL, socket) resolve inside it.
pub fn chdir(dir: &Path) -> VictordResult<()> {
    std::env::set_current_dir(dir).map_err(VictordError::Io)
}
