//! Shared startup sequence: resolve the database directory, chdir into it,
//! load the snapshot, and replay the WAL through the live dispatch path.
//!
//! Mirrors `fileutils.c`'s root/database-directory resolution and the
//! snapshot-then-WAL-replay sequence both `index_main.c` and
//! `table_main.c` run before accepting any connections.

use crate::dispatch::MessageHandler;
use common::paths;
use common::{VictordError, VictordResult};
use std::path::PathBuf;
use tracing::{info, warn};
use wal::Wal;

/// The resolved, created, chdir'd-into working directory for one database,
/// plus the absolute socket path to bind (computed before the chdir, since a
/// relative `-u` override is relative to the caller's original directory).
pub struct DbPaths {
    pub db_dir: PathBuf,
    pub socket_path: PathBuf,
}

/// Resolve `<root>/<name>`, create it if missing, and chdir into it. All
/// snapshot/WAL file operations the caller performs afterward should use the
/// plain relative filenames in `common::paths`.
pub fn prepare_db_dir(
    db_root: &std::path::Path,
    db_name: &str,
    socket_override: Option<PathBuf>,
) -> VictordResult<DbPaths> {
    let db_dir = paths::resolve_db_dir(db_root, db_name)?;
    let socket_path = socket_override.unwrap_or_else(|| db_dir.join(paths::SOCKET_FILE));
    let socket_path = if socket_path.is_absolute() {
        socket_path
    } else {
        std::env::current_dir()
            .map_err(VictordError::Io)?
            .join(socket_path)
    };
    paths::chdir(&db_dir)?;
    Ok(DbPaths {
        db_dir,
        socket_path,
    })
}

/// Replay every entry in the WAL at `wal_path` through `handler`, with
/// WAL-append suppressed (`record = false`). Returns the number of entries
/// replayed.
///
/// Unknown message types are skipped with a warning rather than failing
/// startup — this is the forward-compatibility policy in the spec: a WAL
/// written by a newer server should still mostly replay on an older one.
pub fn replay_wal(wal_path: &std::path::Path, handler: &mut dyn MessageHandler) -> VictordResult<u64> {
    let mut unknown = 0u64;
    let count = wal::replay(wal_path, |frame| {
        if wire::msg::is_mutating_request(frame.msg_type) {
            let _ = handler.handle(frame.msg_type, &frame.payload, false);
        } else {
            unknown += 1;
            warn!(msg_type = frame.msg_type, "skipping non-mutating/unknown WAL entry during replay");
        }
    })
    .map_err(|e| VictordError::Wal(e.to_string()))?;

    if unknown > 0 {
        warn!(count = unknown, "WAL replay skipped unrecognized entries");
    }
    info!(entries = count, path = %wal_path.display(), "WAL replay complete");
    Ok(count)
}

/// Open (creating if necessary) the WAL file for append.
pub fn open_wal(wal_path: &std::path::Path) -> VictordResult<Wal> {
    Wal::open(wal_path).map_err(|e| VictordError::Wal(e.to_string()))
}
