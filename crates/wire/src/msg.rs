//! The closed set of message types, 1-13 plus `ERROR`.
//!
//! `OP_RESULT` is a protocol-level alias, not a distinct wire value: the
//! source's newer code path used a single generic acknowledgement type for
//! both `PUT` and `DEL` where older code had typed `PUT_RESULT`/`DEL_RESULT`.
//! This implementation resolves that by having `OP_RESULT` occupy the
//! `PUT_RESULT` slot (type 9) and retiring the `DEL_RESULT` slot (13) —
//! see `DESIGN.md`.

/// Vector engine: insert a vector under an id.
pub const INSERT: u8 = 1;
/// Vector engine: typed reply to `INSERT`.
pub const INSERT_RESULT: u8 = 2;
/// Vector engine: delete a vector by id.
pub const DELETE: u8 = 3;
/// Vector engine: typed reply to `DELETE`.
pub const DELETE_RESULT: u8 = 4;
/// Vector engine: top-n similarity search.
pub const SEARCH: u8 = 5;
/// Vector engine: reply to `SEARCH`.
pub const MATCH_RESULT: u8 = 6;
/// Shared: a request failed; carries a code and message.
pub const ERROR: u8 = 7;
/// Table engine: insert or overwrite a key.
pub const PUT: u8 = 8;
/// Table engine: generic mutation acknowledgement (occupies the historical
/// `PUT_RESULT` slot; used for both `PUT` and `DEL`).
pub const OP_RESULT: u8 = 9;
/// Table engine: look up a key.
pub const GET: u8 = 10;
/// Table engine: reply to `GET`.
pub const GET_RESULT: u8 = 11;
/// Table engine: delete a key.
pub const DEL: u8 = 12;
/// Retired: legacy typed reply to `DEL`, superseded by `OP_RESULT`. Kept so
/// the closed set matches the source numbering; a WAL or peer that emits it
/// is treated as an unknown type and skipped/closed.
pub const DEL_RESULT_LEGACY: u8 = 13;

/// True if `msg_type` names one of the mutating vector or table requests
/// that must be appended to the WAL on success.
pub fn is_mutating_request(msg_type: u8) -> bool {
    matches!(msg_type, INSERT | DELETE | PUT | DEL)
}

/// Human-readable name for a message type, for logging. Mirrors the
/// source's WAL-inspection tool's type-name table.
pub fn name(msg_type: u8) -> &'static str {
    match msg_type {
        INSERT => "INSERT",
        INSERT_RESULT => "INSERT_RESULT",
        DELETE => "DELETE",
        DELETE_RESULT => "DELETE_RESULT",
        SEARCH => "SEARCH",
        MATCH_RESULT => "MATCH_RESULT",
        ERROR => "ERROR",
        PUT => "PUT",
        OP_RESULT => "OP_RESULT",
        GET => "GET",
        GET_RESULT => "GET_RESULT",
        DEL => "DEL",
        DEL_RESULT_LEGACY => "DEL_RESULT(legacy)",
        _ => "UNKNOWN",
    }
}
