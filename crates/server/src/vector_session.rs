//! The vector engine's dispatcher: `INSERT`/`DELETE`/`SEARCH`.
//!
//! Grounded in `viproto.c` + `index_main.c`'s per-connection handler table,
//! generalized to the single [`crate::dispatch::MessageHandler`] pipeline.

use crate::dispatch::{error_reply, ok_reply, status_reply, MessageHandler, Reply};
use crate::snapshot::{maybe_snapshot, OpCounters};
use engine::VectorIndex;
use std::path::PathBuf;
use tracing::warn;
use wal::Wal;
use wire::codec;
use wire::msg;

/// Owns one vector engine's in-memory index, WAL handle, and snapshot
/// bookkeeping for the lifetime of the server process.
pub struct VectorSession {
    dbname: String,
    index: VectorIndex,
    wal: Wal,
    counters: OpCounters,
    snapshot_path: PathBuf,
}

impl VectorSession {
    pub fn new(dbname: String, index: VectorIndex, wal: Wal, threshold: u64, snapshot_path: PathBuf) -> Self {
        Self {
            dbname,
            index,
            wal,
            counters: OpCounters::new(threshold),
            snapshot_path,
        }
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    fn maybe_snapshot(&mut self) {
        let index = &self.index;
        let path = &self.snapshot_path;
        maybe_snapshot(&mut self.counters, &self.dbname, &mut self.wal, || {
            index.export(path).map_err(|e| e.to_string())
        });
    }

    fn record_wal(&mut self, msg_type: u8, payload: &[u8]) {
        if let Err(e) = self.wal.append(msg_type, payload) {
            warn!(db = %self.dbname, error = %e, "WAL append failed, continuing without durability for this op");
        }
    }
}

impl MessageHandler for VectorSession {
    fn handle(&mut self, msg_type: u8, payload: &[u8], record: bool) -> Reply {
        match msg_type {
            msg::INSERT => {
                let req = match codec::decode_insert(payload) {
                    Ok(req) => req,
                    Err(_) => return Reply::Close,
                };
                match self.index.insert(req.id, req.vector) {
                    Ok(()) => {
                        if record {
                            self.record_wal(msg_type, payload);
                            self.counters.record_add();
                            self.maybe_snapshot();
                        }
                        ok_reply(msg::INSERT_RESULT)
                    }
                    Err(e) => status_reply(msg::ERROR, e.code(), &e.to_string()),
                }
            }
            msg::DELETE => {
                let req = match codec::decode_delete(payload) {
                    Ok(req) => req,
                    Err(_) => return Reply::Close,
                };
                self.index.delete(req.id);
                if record {
                    self.record_wal(msg_type, payload);
                    self.counters.record_del();
                    self.maybe_snapshot();
                }
                ok_reply(msg::DELETE_RESULT)
            }
            msg::SEARCH => {
                let req = match codec::decode_search(payload) {
                    Ok(req) => req,
                    Err(_) => return Reply::Close,
                };
                match self.index.search(&req.vector, req.n) {
                    Ok(matches) => match codec::encode_match_result(&matches) {
                        Ok(body) => Reply::Frame(msg::MATCH_RESULT, body),
                        Err(_) => Reply::Close,
                    },
                    Err(e) => error_reply(e.code(), &e.to_string()),
                }
            }
            _ => Reply::Close,
        }
    }
}
