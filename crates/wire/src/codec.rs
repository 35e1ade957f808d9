//! CBOR payload codec: one `encode_*`/`decode_*` pair per message type.
//!
//! Encoders build a plain Rust value (a tuple mirroring the CBOR array shape
//! in the spec) and hand it to `ciborium`; decoders do the reverse and then
//! apply the handful of validation rules the wire format needs beyond what
//! serde checks for free (arity and element-kind mismatches already fail
//! inside `ciborium`'s tuple/array deserialization).
//!
//! Vectors are carried as `f32`. `ciborium`'s (de)serializer dispatches on
//! the actual CBOR item it reads, so `decode_insert`/`decode_search` accept
//! either a CBOR single- or double-precision float and narrow to `f32`
//! either way, per the numeric interop policy in the spec.
//!
//! Keys and values use [`serde_bytes::ByteBuf`] so they round-trip as CBOR
//! byte strings (major type 2) rather than arrays of small integers.

use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("cbor decode: {0}")]
    Decode(String),
    #[error("cbor encode: {0}")]
    Encode(String),
    #[error("empty key is not allowed")]
    EmptyKey,
}

pub type CodecResult<T> = Result<T, CodecError>;

fn encode<T: Serialize>(value: &T) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf).map_err(|e| CodecError::Encode(e.to_string()))?;
    Ok(buf)
}

fn decode<T: for<'de> Deserialize<'de>>(payload: &[u8]) -> CodecResult<T> {
    ciborium::de::from_reader(payload).map_err(|e| CodecError::Decode(e.to_string()))
}

// ---------------------------------------------------------------------
// Vector engine: INSERT / DELETE / SEARCH / MATCH_RESULT
// ---------------------------------------------------------------------

/// `INSERT`: `[id:uint64, [f32, ...]]`
#[derive(Debug, Clone, PartialEq)]
pub struct InsertRequest {
    pub id: u64,
    pub vector: Vec<f32>,
}

pub fn encode_insert(req: &InsertRequest) -> CodecResult<Vec<u8>> {
    encode(&(req.id, &req.vector))
}

pub fn decode_insert(payload: &[u8]) -> CodecResult<InsertRequest> {
    let (id, vector): (u64, Vec<f32>) = decode(payload)?;
    Ok(InsertRequest { id, vector })
}

/// `DELETE`: `[id:uint64]`
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteRequest {
    pub id: u64,
}

pub fn encode_delete(req: &DeleteRequest) -> CodecResult<Vec<u8>> {
    encode(&(req.id,))
}

pub fn decode_delete(payload: &[u8]) -> CodecResult<DeleteRequest> {
    let (id,): (u64,) = decode(payload)?;
    Ok(DeleteRequest { id })
}

/// `SEARCH`: `[[f32, ...], n:uint]`
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub vector: Vec<f32>,
    pub n: u32,
}

pub fn encode_search(req: &SearchRequest) -> CodecResult<Vec<u8>> {
    encode(&(&req.vector, req.n))
}

pub fn decode_search(payload: &[u8]) -> CodecResult<SearchRequest> {
    let (vector, n): (Vec<f32>, u32) = decode(payload)?;
    Ok(SearchRequest { vector, n })
}

/// `MATCH_RESULT`: `[[id:uint64, distance:f32], ...]`
pub fn encode_match_result(matches: &[(u64, f32)]) -> CodecResult<Vec<u8>> {
    encode(&matches.to_vec())
}

pub fn decode_match_result(payload: &[u8]) -> CodecResult<Vec<(u64, f32)>> {
    decode(payload)
}

// ---------------------------------------------------------------------
// Table engine: PUT / GET / DEL / GET_RESULT
// ---------------------------------------------------------------------

/// `PUT`: `[key:bytes, value:bytes]`
#[derive(Debug, Clone, PartialEq)]
pub struct PutRequest {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

pub fn encode_put(req: &PutRequest) -> CodecResult<Vec<u8>> {
    encode(&(
        ByteBuf::from(req.key.clone()),
        ByteBuf::from(req.value.clone()),
    ))
}

pub fn decode_put(payload: &[u8]) -> CodecResult<PutRequest> {
    let (key, value): (ByteBuf, ByteBuf) = decode(payload)?;
    if key.is_empty() {
        return Err(CodecError::EmptyKey);
    }
    Ok(PutRequest {
        key: key.into_vec(),
        value: value.into_vec(),
    })
}

/// `GET` / `DEL`: `[key:bytes]`
#[derive(Debug, Clone, PartialEq)]
pub struct KeyRequest {
    pub key: Vec<u8>,
}

pub fn encode_key_request(key: &[u8]) -> CodecResult<Vec<u8>> {
    encode(&(ByteBuf::from(key.to_vec()),))
}

pub fn decode_key_request(payload: &[u8]) -> CodecResult<KeyRequest> {
    let (key,): (ByteBuf,) = decode(payload)?;
    if key.is_empty() {
        return Err(CodecError::EmptyKey);
    }
    Ok(KeyRequest {
        key: key.into_vec(),
    })
}

/// `GET_RESULT`: `[value:bytes]`; an empty byte string signals "not found".
pub fn encode_get_result(value: Option<&[u8]>) -> CodecResult<Vec<u8>> {
    encode(&(ByteBuf::from(value.unwrap_or(&[]).to_vec()),))
}

pub fn decode_get_result(payload: &[u8]) -> CodecResult<Option<Vec<u8>>> {
    let (value,): (ByteBuf,) = decode(payload)?;
    let bytes = value.into_vec();
    if bytes.is_empty() {
        Ok(None)
    } else {
        Ok(Some(bytes))
    }
}

// ---------------------------------------------------------------------
// Shared: OP_RESULT / ERROR / typed vector results
// ---------------------------------------------------------------------

/// `OP_RESULT` / `ERROR` / `INSERT_RESULT` / `DELETE_RESULT`: `[code:uint32, message:text]`
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReply {
    pub code: u32,
    pub message: String,
}

pub fn encode_status(code: u32, message: &str) -> CodecResult<Vec<u8>> {
    encode(&(code, message))
}

pub fn decode_status(payload: &[u8]) -> CodecResult<StatusReply> {
    let (code, message): (u32, String) = decode(payload)?;
    Ok(StatusReply { code, message })
}
