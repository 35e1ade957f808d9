//! Integration tests against the public session/connection-loop API.
//!
//! These exercise the same [`dispatch::MessageHandler`] pipeline the two
//! server binaries drive, either directly (unit-level dispatch tests) or
//! through a real UNIX socket and the live [`conn::run`] loop (end-to-end).

use crate::conn;
use crate::dispatch::{MessageHandler, Reply};
use crate::startup;
use crate::table_session::TableSession;
use crate::vector_session::VectorSession;
use common::codes;
use common::paths::MAX_CONNECTIONS;
use engine::{IndexKind, KvTable, Similarity, VectorIndex};
use std::io::Read;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;
use wire::{codec, frame, msg};

fn table_session(dir: &std::path::Path, threshold: u64) -> TableSession {
    let wal = startup::open_wal(&dir.join("db.twal")).unwrap();
    TableSession::new("t1".to_string(), KvTable::create(), wal, threshold, dir.join("db.table"))
}

fn vector_session(dir: &std::path::Path, threshold: u64) -> VectorSession {
    let wal = startup::open_wal(&dir.join("db.iwal")).unwrap();
    let index = VectorIndex::create(IndexKind::Flat, Similarity::Cosine, 3);
    VectorSession::new("v1".to_string(), index, wal, threshold, dir.join("db.index"))
}

#[test]
fn kv_put_get_del_round_trip_through_dispatch() {
    let dir = tempdir().unwrap();
    let mut session = table_session(dir.path(), 100);

    let put = codec::encode_put(&codec::PutRequest {
        key: b"alpha".to_vec(),
        value: b"one".to_vec(),
    })
    .unwrap();
    assert!(matches!(
        session.handle(msg::PUT, &put, true),
        Reply::Frame(t, _) if t == msg::OP_RESULT
    ));

    let get = codec::encode_key_request(b"alpha").unwrap();
    match session.handle(msg::GET, &get, true) {
        Reply::Frame(t, payload) => {
            assert_eq!(t, msg::GET_RESULT);
            assert_eq!(codec::decode_get_result(&payload).unwrap(), Some(b"one".to_vec()));
        }
        Reply::Close => panic!("expected a reply"),
    }

    let del = codec::encode_key_request(b"alpha").unwrap();
    assert!(matches!(
        session.handle(msg::DEL, &del, true),
        Reply::Frame(t, _) if t == msg::OP_RESULT
    ));

    match session.handle(msg::GET, &get, true) {
        Reply::Frame(t, payload) => {
            assert_eq!(t, msg::ERROR);
            let status = codec::decode_status(&payload).unwrap();
            assert_eq!(status.code, codes::KV_KEY_NOT_FOUND);
        }
        Reply::Close => panic!("expected an ERROR reply"),
    }
}

#[test]
fn unknown_message_type_closes_without_a_reply() {
    let dir = tempdir().unwrap();
    let mut session = table_session(dir.path(), 100);
    assert_eq!(session.handle(14, &[], true), Reply::Close);
}

#[test]
fn empty_key_is_a_rejected_request_not_a_protocol_violation() {
    let dir = tempdir().unwrap();
    let mut session = table_session(dir.path(), 100);
    let put = codec::encode_put(&codec::PutRequest {
        key: Vec::new(),
        value: b"one".to_vec(),
    })
    .unwrap();
    match session.handle(msg::PUT, &put, true) {
        Reply::Frame(t, payload) => {
            assert_eq!(t, msg::ERROR);
            assert_eq!(codec::decode_status(&payload).unwrap().code, codes::BAD_REQUEST);
        }
        Reply::Close => panic!("an empty key should reply with ERROR, not close the connection"),
    }
}

#[test]
fn wal_replay_reproduces_live_dispatch_state() {
    let dir = tempdir().unwrap();
    let wal_path = dir.path().join("db.twal");

    {
        let mut session = table_session(dir.path(), 1000);
        let put1 = codec::encode_put(&codec::PutRequest {
            key: b"k1".to_vec(),
            value: b"v1".to_vec(),
        })
        .unwrap();
        let put2 = codec::encode_put(&codec::PutRequest {
            key: b"k2".to_vec(),
            value: b"v2".to_vec(),
        })
        .unwrap();
        session.handle(msg::PUT, &put1, true);
        session.handle(msg::PUT, &put2, true);
    }

    // Fresh session, as on restart: replay the WAL with append suppressed.
    let mut restarted = table_session(dir.path(), 1000);
    startup::replay_wal(&wal_path, &mut restarted).unwrap();

    let get1 = codec::encode_key_request(b"k1").unwrap();
    match restarted.handle(msg::GET, &get1, true) {
        Reply::Frame(_, payload) => {
            assert_eq!(codec::decode_get_result(&payload).unwrap(), Some(b"v1".to_vec()));
        }
        Reply::Close => panic!("expected a reply"),
    }
}

#[test]
fn snapshot_flush_truncates_wal_once_threshold_exceeded() {
    let dir = tempdir().unwrap();
    let wal_path = dir.path().join("db.twal");
    let mut session = table_session(dir.path(), 1);

    for (k, v) in [("k1", "v1"), ("k2", "v2"), ("k3", "v3")] {
        let put = codec::encode_put(&codec::PutRequest {
            key: k.as_bytes().to_vec(),
            value: v.as_bytes().to_vec(),
        })
        .unwrap();
        session.handle(msg::PUT, &put, true);
    }

    assert!(dir.path().join("db.table").exists());
    let mut seen = 0u64;
    wal::replay(&wal_path, |_| seen += 1).unwrap();
    assert_eq!(seen, 0, "WAL should have been truncated by the snapshot flush");

    let restored = engine::KvTable::load(dir.path().join("db.table")).unwrap();
    assert_eq!(restored.size(), 3);
}

#[test]
fn vector_insert_and_search_through_dispatch() {
    let dir = tempdir().unwrap();
    let mut session = vector_session(dir.path(), 100);

    let insert1 = codec::encode_insert(&codec::InsertRequest {
        id: 1,
        vector: vec![1.0, 0.0, 0.0],
    })
    .unwrap();
    let insert2 = codec::encode_insert(&codec::InsertRequest {
        id: 2,
        vector: vec![0.0, 1.0, 0.0],
    })
    .unwrap();
    assert!(matches!(
        session.handle(msg::INSERT, &insert1, true),
        Reply::Frame(t, _) if t == msg::INSERT_RESULT
    ));
    session.handle(msg::INSERT, &insert2, true);

    let search = codec::encode_search(&codec::SearchRequest {
        vector: vec![1.0, 0.0, 0.0],
        n: 1,
    })
    .unwrap();
    match session.handle(msg::SEARCH, &search, true) {
        Reply::Frame(t, payload) => {
            assert_eq!(t, msg::MATCH_RESULT);
            let matches = codec::decode_match_result(&payload).unwrap();
            assert_eq!(matches[0].0, 1);
        }
        Reply::Close => panic!("expected a reply"),
    }
}

#[test]
fn search_with_n_zero_returns_an_empty_match_result() {
    let dir = tempdir().unwrap();
    let mut session = vector_session(dir.path(), 100);
    let insert = codec::encode_insert(&codec::InsertRequest {
        id: 1,
        vector: vec![1.0, 0.0, 0.0],
    })
    .unwrap();
    session.handle(msg::INSERT, &insert, true);

    let search = codec::encode_search(&codec::SearchRequest {
        vector: vec![1.0, 0.0, 0.0],
        n: 0,
    })
    .unwrap();
    match session.handle(msg::SEARCH, &search, true) {
        Reply::Frame(_, payload) => assert!(codec::decode_match_result(&payload).unwrap().is_empty()),
        Reply::Close => panic!("expected a reply"),
    }
}

#[test]
fn end_to_end_kv_round_trip_over_a_real_socket() {
    let dir = tempdir().unwrap();
    let socket_path = dir.path().join("socket.unix");
    let mut session = table_session(dir.path(), 1000);
    let shutdown = Arc::new(AtomicBool::new(false));

    let loop_socket = socket_path.clone();
    let loop_shutdown = Arc::clone(&shutdown);
    let handle = thread::spawn(move || {
        conn::run(&loop_socket, &mut session, loop_shutdown).unwrap();
    });

    // Give the loop a moment to bind and start listening.
    for _ in 0..200 {
        if socket_path.exists() {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }

    let mut client = StdUnixStream::connect(&socket_path).unwrap();
    let put = codec::encode_put(&codec::PutRequest {
        key: b"alpha".to_vec(),
        value: b"one".to_vec(),
    })
    .unwrap();
    frame::write_frame_blocking(&mut client, msg::PUT, &put).unwrap();
    let reply = frame::read_frame_blocking(&mut client).unwrap().unwrap();
    assert_eq!(reply.msg_type, msg::OP_RESULT);

    let get = codec::encode_key_request(b"alpha").unwrap();
    frame::write_frame_blocking(&mut client, msg::GET, &get).unwrap();
    let reply = frame::read_frame_blocking(&mut client).unwrap().unwrap();
    assert_eq!(reply.msg_type, msg::GET_RESULT);
    assert_eq!(
        codec::decode_get_result(&reply.payload).unwrap(),
        Some(b"one".to_vec())
    );

    drop(client);
    shutdown.store(true, Ordering::SeqCst);
    handle.join().unwrap();
    assert!(!socket_path.exists(), "socket path should be unlinked on shutdown");
}

#[test]
fn connection_cap_rejects_the_129th_client() {
    let dir = tempdir().unwrap();
    let socket_path = dir.path().join("socket.unix");
    let mut session = table_session(dir.path(), 1000);
    let shutdown = Arc::new(AtomicBool::new(false));

    let loop_socket = socket_path.clone();
    let loop_shutdown = Arc::clone(&shutdown);
    let handle = thread::spawn(move || {
        conn::run(&loop_socket, &mut session, loop_shutdown).unwrap();
    });

    for _ in 0..200 {
        if socket_path.exists() {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }

    let mut clients: Vec<StdUnixStream> = (0..MAX_CONNECTIONS)
        .map(|_| StdUnixStream::connect(&socket_path).unwrap())
        .collect();

    // Give the loop a chance to accept and register all MAX_CONNECTIONS
    // clients before the over-limit connection below arrives.
    thread::sleep(Duration::from_millis(200));

    let mut over_limit = StdUnixStream::connect(&socket_path).unwrap();
    over_limit
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let mut buf = [0u8; 1];
    let n = over_limit.read(&mut buf).unwrap();
    assert_eq!(n, 0, "the 129th connection should be closed immediately");

    // The first MAX_CONNECTIONS connections should remain operational.
    let mut probe = clients.pop().unwrap();
    let put = codec::encode_put(&codec::PutRequest {
        key: b"alive".to_vec(),
        value: b"yes".to_vec(),
    })
    .unwrap();
    frame::write_frame_blocking(&mut probe, msg::PUT, &put).unwrap();
    let reply = frame::read_frame_blocking(&mut probe).unwrap().unwrap();
    assert_eq!(reply.msg_type, msg::OP_RESULT);

    drop(clients);
    drop(probe);
    drop(over_limit);
    shutdown.store(true, Ordering::SeqCst);
    handle.join().unwrap();
}
