//! Runtime configuration shared by both server binaries.
//!
//! Resolved once at startup from CLI args and the environment, then handed
//! down to the path/snapshot/connection-loop layers. See `common::paths` for
//! the underlying environment variables and defaults.

use common::paths;
use std::path::PathBuf;

/// Configuration common to the vector and table servers: which database to
/// serve, where its root lives, and where to listen.
///
/// # Example
/// ```
/// use server::config::ServerConfig;
///
/// let config = ServerConfig::builder()
///     .db_name("t1".to_string())
///     .build();
/// assert_eq!(config.export_threshold, 10);
/// ```
#[derive(Clone, Debug, bon::Builder)]
pub struct ServerConfig {
    /// Name of the database this process serves; also its directory name
    /// under the database root.
    pub db_name: String,
    /// Root directory holding one subdirectory per database.
    #[builder(default = paths::db_root())]
    pub db_root: PathBuf,
    /// UNIX socket path to listen on. Defaults to `<root>/<name>/socket.unix`,
    /// resolved after `db_root`/`db_name` are known (see [`ServerConfig::socket_path`]).
    pub socket_path: Option<PathBuf>,
    /// Operation count between automatic snapshot flushes.
    #[builder(default = paths::export_threshold())]
    pub export_threshold: u64,
}

impl ServerConfig {
    /// Resolve the socket path this server should bind: the explicit
    /// override if given, otherwise the default filename inside `db_dir`.
    pub fn socket_path(&self, db_dir: &std::path::Path) -> PathBuf {
        self.socket_path
            .clone()
            .unwrap_or_else(|| db_dir.join(paths::SOCKET_FILE))
    }
}
