use crate::paths::{resolve_db_dir, DEFAULT_EXPORT_THRESHOLD};
use tempfile::tempdir;

#[test]
fn resolve_db_dir_creates_missing_directory() {
    let root = tempdir().unwrap();
    let dir = resolve_db_dir(root.path(), "t1").unwrap();
    assert!(dir.is_dir());
    assert_eq!(dir, root.path().join("t1"));
}

#[test]
fn resolve_db_dir_is_idempotent() {
    let root = tempdir().unwrap();
    let first = resolve_db_dir(root.path(), "t1").unwrap();
    let second = resolve_db_dir(root.path(), "t1").unwrap();
    assert_eq!(first, second);
}

#[test]
fn resolve_db_dir_rejects_non_directory() {
    let root = tempdir().unwrap();
    let file_path = root.path().join("not_a_dir");
    std::fs::write(&file_path, b"x").unwrap();
    let err = resolve_db_dir(root.path(), "not_a_dir").unwrap_err();
    assert!(err.to_string().contains("not a directory"));
}

#[cfg(unix)]
#[test]
fn resolve_db_dir_uses_mode_0700() {
    use std::os::unix::fs::PermissionsExt;
    let root = tempdir().unwrap();
    let dir = resolve_db_dir(root.path(), "t1").unwrap();
    let mode = std::fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o700);
}

#[test]
fn default_export_threshold_is_ten() {
    assert_eq!(DEFAULT_EXPORT_THRESHOLD, 10);
}
