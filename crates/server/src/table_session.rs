//! The table engine's dispatcher: `PUT`/`GET`/`DEL`.
//!
//! Grounded in `kvproto.c` + `table_main.c`'s per-connection handler table,
//! generalized to the single [`crate::dispatch::MessageHandler`] pipeline.

use crate::dispatch::{error_reply, ok_reply, status_reply, MessageHandler, Reply};
use crate::snapshot::{maybe_snapshot, OpCounters};
use common::codes;
use engine::KvTable;
use std::path::PathBuf;
use tracing::warn;
use wal::Wal;
use wire::codec::{self, CodecError};
use wire::msg;

/// Map a decode failure to the protocol taxonomy: a zero-length key is a
/// rejected request (`ERROR(BAD_REQUEST)`, connection stays open), anything
/// else is a structural protocol violation (connection closes).
fn reply_for_decode_error(err: CodecError) -> Reply {
    match err {
        CodecError::EmptyKey => error_reply(codes::BAD_REQUEST, "empty key is not allowed"),
        CodecError::Decode(_) | CodecError::Encode(_) => Reply::Close,
    }
}

/// Owns one table engine's in-memory map, WAL handle, and snapshot
/// bookkeeping for the lifetime of the server process.
pub struct TableSession {
    dbname: String,
    table: KvTable,
    wal: Wal,
    counters: OpCounters,
    snapshot_path: PathBuf,
}

impl TableSession {
    pub fn new(dbname: String, table: KvTable, wal: Wal, threshold: u64, snapshot_path: PathBuf) -> Self {
        Self {
            dbname,
            table,
            wal,
            counters: OpCounters::new(threshold),
            snapshot_path,
        }
    }

    pub fn table(&self) -> &KvTable {
        &self.table
    }

    fn maybe_snapshot(&mut self) {
        let table = &self.table;
        let path = &self.snapshot_path;
        maybe_snapshot(&mut self.counters, &self.dbname, &mut self.wal, || {
            table.dump(path).map_err(|e| e.to_string())
        });
    }

    fn record_wal(&mut self, msg_type: u8, payload: &[u8]) {
        if let Err(e) = self.wal.append(msg_type, payload) {
            warn!(db = %self.dbname, error = %e, "WAL append failed, continuing without durability for this op");
        }
    }
}

impl MessageHandler for TableSession {
    fn handle(&mut self, msg_type: u8, payload: &[u8], record: bool) -> Reply {
        match msg_type {
            msg::PUT => {
                let req = match codec::decode_put(payload) {
                    Ok(req) => req,
                    Err(e) => return reply_for_decode_error(e),
                };
                match self.table.put(req.key, req.value) {
                    Ok(()) => {
                        if record {
                            self.record_wal(msg_type, payload);
                            self.counters.record_add();
                            self.maybe_snapshot();
                        }
                        ok_reply(msg::OP_RESULT)
                    }
                    Err(e) => status_reply(msg::ERROR, e.code(), &e.to_string()),
                }
            }
            msg::DEL => {
                let req = match codec::decode_key_request(payload) {
                    Ok(req) => req,
                    Err(e) => return reply_for_decode_error(e),
                };
                match self.table.del(&req.key) {
                    Ok(()) => {
                        if record {
                            self.record_wal(msg_type, payload);
                            self.counters.record_del();
                            self.maybe_snapshot();
                        }
                        ok_reply(msg::OP_RESULT)
                    }
                    Err(e) => status_reply(msg::ERROR, e.code(), &e.to_string()),
                }
            }
            msg::GET => {
                let req = match codec::decode_key_request(payload) {
                    Ok(req) => req,
                    Err(e) => return reply_for_decode_error(e),
                };
                match self.table.get(&req.key) {
                    Ok(Some(value)) => match codec::encode_get_result(Some(value)) {
                        Ok(body) => Reply::Frame(msg::GET_RESULT, body),
                        Err(_) => Reply::Close,
                    },
                    Ok(None) => error_reply(codes::KV_KEY_NOT_FOUND, "key not found"),
                    Err(e) => error_reply(e.code(), &e.to_string()),
                }
            }
            _ => Reply::Close,
        }
    }
}
