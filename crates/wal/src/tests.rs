use super::*;
use std::io::Write as _;
use tempfile::tempdir;

#[test]
fn append_and_replay_round_trip() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("db.twal");

    let mut wal = Wal::open(&file).unwrap();
    wal.append(8, b"put-one").unwrap();
    wal.append(12, b"del-one").unwrap();
    wal.sync().unwrap();

    let mut seen = Vec::new();
    let count = replay(&file, |frame| seen.push((frame.msg_type, frame.payload))).unwrap();

    assert_eq!(count, 2);
    assert_eq!(seen[0], (8, b"put-one".to_vec()));
    assert_eq!(seen[1], (12, b"del-one".to_vec()));
}

#[test]
fn replay_missing_file_yields_zero_entries() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("never-written.ivwal");

    let mut seen = 0u64;
    let count = replay(&file, |_| seen += 1).unwrap();
    assert_eq!(count, 0);
    assert_eq!(seen, 0);
}

#[test]
fn append_is_durable_across_reopen() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("db.iwal");

    {
        let mut wal = Wal::open(&file).unwrap();
        wal.append(1, b"first").unwrap();
        wal.sync().unwrap();
    }
    {
        let mut wal = Wal::open(&file).unwrap();
        wal.append(3, b"second").unwrap();
        wal.sync().unwrap();
    }

    let mut seen = Vec::new();
    replay(&file, |frame| seen.push(frame.msg_type)).unwrap();
    assert_eq!(seen, vec![1, 3]);
}

#[test]
fn truncate_resets_the_log_for_further_writes() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("db.twal");

    let mut wal = Wal::open(&file).unwrap();
    wal.append(8, b"a").unwrap();
    wal.append(8, b"b").unwrap();
    wal.sync().unwrap();

    wal.truncate().unwrap();
    wal.append(8, b"c").unwrap();
    wal.sync().unwrap();

    let mut seen = Vec::new();
    replay(&file, |frame| seen.push(frame.payload)).unwrap();
    assert_eq!(seen, vec![b"c".to_vec()]);
}

#[test]
fn replay_reports_corrupt_on_truncated_trailing_frame() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("db.iwal");

    {
        let mut wal = Wal::open(&file).unwrap();
        wal.append(1, b"whole-frame").unwrap();
        wal.sync().unwrap();
    }

    // Append a header that promises more payload than actually follows,
    // simulating a crash mid-write.
    {
        let mut f = OpenOptions::new().append(true).open(&file).unwrap();
        let header = frame::encode_header(3, 100).unwrap();
        f.write_all(&header).unwrap();
        f.write_all(b"short").unwrap();
    }

    let mut seen = Vec::new();
    let err = replay(&file, |frame| seen.push(frame.msg_type)).unwrap_err();
    assert!(matches!(err, WalError::Corrupt(_)));
    // The one clean frame before the corruption was still applied.
    assert_eq!(seen, vec![1]);
}

#[test]
fn unlink_missing_file_is_not_an_error() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("does-not-exist.ivwal");
    assert!(Wal::unlink(&file).is_ok());
}
