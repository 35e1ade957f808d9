//! `victor-table-server` — the key-value table server binary.
//!
//! Mirrors `table_main.c`'s argument handling (`-n`, `-u`) and startup
//! sequence (resolve db dir, load snapshot, replay WAL, serve).

use clap::Parser;
use engine::KvTable;
use server::config::ServerConfig;
use server::table_session::TableSession;
use server::{conn, logging, signals, startup};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

/// VictorDB key-value table server.
#[derive(Parser, Debug)]
#[command(name = "victor-table-server")]
struct Args {
    /// Database name; also the directory under the database root.
    #[arg(short = 'n', long = "name")]
    name: String,

    /// UNIX socket path to listen on. Defaults to `<root>/<name>/socket.unix`.
    #[arg(short = 'u', long = "socket")]
    socket: Option<PathBuf>,
}

fn main() -> ExitCode {
    logging::init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "startup failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> common::VictordResult<()> {
    let (export_threshold, threshold_warning) = common::paths::export_threshold_with_warning();
    if let Some(message) = threshold_warning {
        warn!(%message, "falling back to the default export threshold");
    }
    let config = ServerConfig::builder()
        .db_name(args.name.clone())
        .export_threshold(export_threshold)
        .build();
    let paths = startup::prepare_db_dir(&config.db_root, &config.db_name, args.socket)?;

    let table = KvTable::load(common::paths::TABLE_FILE)
        .map_err(|e| common::VictordError::Engine(e.to_string()))?;

    let wal = startup::open_wal(std::path::Path::new(common::paths::TWAL_FILE))?;
    let mut session = TableSession::new(
        args.name.clone(),
        table,
        wal,
        config.export_threshold,
        PathBuf::from(common::paths::TABLE_FILE),
    );

    startup::replay_wal(std::path::Path::new(common::paths::TWAL_FILE), &mut session)?;

    info!(db = %args.name, entries = session.table().size(), "table server ready");

    let shutdown = signals::install().map_err(common::VictordError::Io)?;
    conn::run(&paths.socket_path, &mut session, shutdown)
}
