use crate::codec::*;
use crate::frame::*;
use proptest::prelude::*;
use std::io::Cursor;

#[test]
fn header_round_trip_basic() {
    let header = encode_header(5, 42).unwrap();
    assert_eq!(decode_header(header), (5, 42));
}

#[test]
fn header_type_15_round_trips() {
    let header = encode_header(15, 0).unwrap();
    assert_eq!(decode_header(header), (15, 0));
}

#[test]
fn header_rejects_type_above_15() {
    assert!(matches!(
        encode_header(16, 0),
        Err(FrameError::TypeOutOfRange(16))
    ));
}

#[test]
fn header_accepts_max_len() {
    let header = encode_header(0, MAX_PAYLOAD_LEN).unwrap();
    assert_eq!(decode_header(header), (0, MAX_PAYLOAD_LEN));
}

#[test]
fn header_rejects_len_above_max() {
    assert!(matches!(
        encode_header(0, MAX_PAYLOAD_LEN + 1),
        Err(FrameError::LenOutOfRange(_))
    ));
}

proptest! {
    #[test]
    fn header_round_trip_proptest(msg_type in 0u8..=15, len in 0u32..=MAX_PAYLOAD_LEN) {
        let header = encode_header(msg_type, len).unwrap();
        prop_assert_eq!(decode_header(header), (msg_type, len));
    }
}

#[test]
fn frame_round_trip_over_blocking_stream() {
    let mut buf = Vec::new();
    write_frame_blocking(&mut buf, 8, b"hello").unwrap();

    let mut cursor = Cursor::new(buf);
    let frame = read_frame_blocking(&mut cursor).unwrap().unwrap();
    assert_eq!(frame.msg_type, 8);
    assert_eq!(frame.payload, b"hello");
}

#[test]
fn frame_zero_length_payload_is_valid() {
    let mut buf = Vec::new();
    write_frame_blocking(&mut buf, 3, b"").unwrap();
    let mut cursor = Cursor::new(buf);
    let frame = read_frame_blocking(&mut cursor).unwrap().unwrap();
    assert_eq!(frame.payload.len(), 0);
}

#[test]
fn clean_eof_at_frame_boundary_is_not_an_error() {
    let mut cursor = Cursor::new(Vec::<u8>::new());
    let result = read_frame_blocking(&mut cursor).unwrap();
    assert!(result.is_none());
}

#[test]
fn short_read_mid_header_is_an_error() {
    let mut cursor = Cursor::new(vec![0u8, 1u8]);
    let err = read_frame_blocking(&mut cursor).unwrap_err();
    assert!(matches!(err, FrameError::ShortRead { .. }));
}

#[test]
fn short_read_mid_payload_is_an_error() {
    // Header declares 5 payload bytes but only 2 are present.
    let header = encode_header(1, 5).unwrap();
    let mut bytes = header.to_vec();
    bytes.extend_from_slice(b"ab");
    let mut cursor = Cursor::new(bytes);
    let err = read_frame_blocking(&mut cursor).unwrap_err();
    assert!(matches!(err, FrameError::ShortRead { .. }));
}

#[test]
fn insert_round_trip() {
    let req = InsertRequest {
        id: 7,
        vector: vec![1.0, 2.5, -3.25],
    };
    let payload = encode_insert(&req).unwrap();
    let decoded = decode_insert(&payload).unwrap();
    assert_eq!(decoded, req);
}

#[test]
fn search_round_trip_with_n_zero() {
    let req = SearchRequest {
        vector: vec![1.0, 0.0, 0.0],
        n: 0,
    };
    let payload = encode_search(&req).unwrap();
    let decoded = decode_search(&payload).unwrap();
    assert_eq!(decoded, req);
}

#[test]
fn match_result_round_trip() {
    let matches = vec![(1u64, 0.1f32), (2u64, 0.9f32)];
    let payload = encode_match_result(&matches).unwrap();
    let decoded = decode_match_result(&payload).unwrap();
    assert_eq!(decoded, matches);
}

#[test]
fn decoder_accepts_binary64_vector_and_narrows_to_f32() {
    // Hand-encode an INSERT payload where the vector's floats are emitted
    // as CBOR double-precision, simulating a client that defaults to f64.
    #[derive(serde::Serialize)]
    struct WideInsert(u64, Vec<f64>);
    let mut buf = Vec::new();
    ciborium::ser::into_writer(&WideInsert(9, vec![1.0, 2.0]), &mut buf).unwrap();

    let decoded = decode_insert(&buf).unwrap();
    assert_eq!(decoded.id, 9);
    assert_eq!(decoded.vector, vec![1.0f32, 2.0f32]);
}

#[test]
fn put_get_del_round_trip() {
    let put = PutRequest {
        key: b"alpha".to_vec(),
        value: b"one".to_vec(),
    };
    let payload = encode_put(&put).unwrap();
    assert_eq!(decode_put(&payload).unwrap(), put);

    let key_payload = encode_key_request(b"alpha").unwrap();
    let decoded = decode_key_request(&key_payload).unwrap();
    assert_eq!(decoded.key, b"alpha");
}

#[test]
fn put_rejects_empty_key() {
    let put = PutRequest {
        key: Vec::new(),
        value: b"one".to_vec(),
    };
    let payload = encode_put(&put).unwrap();
    assert!(matches!(decode_put(&payload), Err(CodecError::EmptyKey)));
}

#[test]
fn get_result_empty_bytestring_means_not_found() {
    let payload = encode_get_result(None).unwrap();
    assert_eq!(decode_get_result(&payload).unwrap(), None);

    let payload = encode_get_result(Some(b"one")).unwrap();
    assert_eq!(decode_get_result(&payload).unwrap(), Some(b"one".to_vec()));
}

#[test]
fn status_round_trip() {
    let payload = encode_status(common::codes::KV_KEY_NOT_FOUND, "not found").unwrap();
    let decoded = decode_status(&payload).unwrap();
    assert_eq!(decoded.code, common::codes::KV_KEY_NOT_FOUND);
    assert_eq!(decoded.message, "not found");
}

#[test]
fn malformed_cbor_fails_without_panicking() {
    let garbage = vec![0xFFu8; 8];
    assert!(decode_insert(&garbage).is_err());
    assert!(decode_put(&garbage).is_err());
}
