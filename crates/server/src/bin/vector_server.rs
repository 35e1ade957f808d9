//! `victor-vector-server` — the vector index server binary.
//!
//! Mirrors `index_main.c`'s argument handling (`-n`, `-d`, `-t`, `-m`, `-u`)
//! and startup sequence (resolve db dir, load snapshot, replay WAL, serve).

use clap::{Parser, ValueEnum};
use engine::{IndexKind, Similarity, VectorIndex};
use server::config::ServerConfig;
use server::vector_session::VectorSession;
use server::{conn, logging, signals, startup};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum IndexKindArg {
    Flat,
    Hnsw,
}

impl From<IndexKindArg> for IndexKind {
    fn from(value: IndexKindArg) -> Self {
        match value {
            IndexKindArg::Flat => IndexKind::Flat,
            IndexKindArg::Hnsw => IndexKind::Hnsw,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SimilarityArg {
    Cosine,
    Dotp,
    L2norm,
}

impl From<SimilarityArg> for Similarity {
    fn from(value: SimilarityArg) -> Self {
        match value {
            SimilarityArg::Cosine => Similarity::Cosine,
            SimilarityArg::Dotp => Similarity::Dotp,
            SimilarityArg::L2norm => Similarity::L2Norm,
        }
    }
}

/// VictorDB vector index server.
#[derive(Parser, Debug)]
#[command(name = "victor-vector-server")]
struct Args {
    /// Database name; also the directory under the database root.
    #[arg(short = 'n', long = "name")]
    name: String,

    /// Vector dimensionality.
    #[arg(short = 'd', long = "dims")]
    dims: u32,

    /// Index structure to build.
    #[arg(short = 't', long = "type", value_enum, default_value_t = IndexKindArg::Hnsw)]
    kind: IndexKindArg,

    /// Similarity metric used for ranking search results.
    #[arg(short = 'm', long = "metric", value_enum, default_value_t = SimilarityArg::Cosine)]
    metric: SimilarityArg,

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

    let mut index = VectorIndex::create(args.kind.into(), args.metric.into(), args.dims);
    index
        .import(common::paths::INDEX_FILE)
        .map_err(|e| common::VictordError::Engine(e.to_string()))?;

    let wal = startup::open_wal(std::path::Path::new(common::paths::IWAL_FILE))?;
    let mut session = VectorSession::new(
        args.name.clone(),
        index,
        wal,
        config.export_threshold,
        PathBuf::from(common::paths::INDEX_FILE),
    );

    startup::replay_wal(std::path::Path::new(common::paths::IWAL_FILE), &mut session)?;

    info!(
        db = %args.name,
        dims = args.dims,
        entries = session.index().size(),
        "vector server ready"
    );

    let shutdown = signals::install().map_err(common::VictordError::Io)?;
    conn::run(&paths.socket_path, &mut session, shutdown)
}
