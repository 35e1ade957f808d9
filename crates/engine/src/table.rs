//! An in-memory key-value table.
//!
//! `KvTable` is the concrete backing for the table engine's collaborator
//! contract (`create`/`load`/`dump`/`put`/`get`/`del`/`size`/`destroy`, see
//! `DESIGN.md`). Keys and values are opaque byte strings; ordering is not
//! part of the contract, so a hash map is the natural structure.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

/// An in-memory table mapping opaque byte keys to opaque byte values.
#[derive(Debug, Default)]
pub struct KvTable {
    entries: HashMap<Vec<u8>, Vec<u8>>,
}

impl KvTable {
    /// Create an empty table.
    pub fn create() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Load a table from a snapshot file at `path`. A missing file is
    /// treated as "nothing to load" (a fresh table).
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let mut table = Self::create();
        table.import(path)?;
        Ok(table)
    }

    /// Insert or overwrite the value stored under `key`. Rejects an empty
    /// key, matching the wire codec's `PUT` validation.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> EngineResult<()> {
        if key.is_empty() {
            return Err(EngineError::EmptyKey);
        }
        self.entries.insert(key, value);
        Ok(())
    }

    /// Look up `key`. `None` means the key is not present.
    pub fn get(&self, key: &[u8]) -> EngineResult<Option<&[u8]>> {
        if key.is_empty() {
            return Err(EngineError::EmptyKey);
        }
        Ok(self.entries.get(key).map(Vec::as_slice))
    }

    /// Delete `key`. Deleting an absent key is a no-op, not an error — this
    /// is what makes WAL replay of a `DEL` idempotent.
    pub fn del(&mut self, key: &[u8]) -> EngineResult<()> {
        if key.is_empty() {
            return Err(EngineError::EmptyKey);
        }
        self.entries.remove(key);
        Ok(())
    }

    pub fn size(&self) -> u64 {
        self.entries.len() as u64
    }

    /// Write a complete snapshot of this table to `path`.
    pub fn dump(&self, path: impl AsRef<Path>) -> EngineResult<()> {
        let file = File::create(path).map_err(|e| EngineError::Snapshot(e.to_string()))?;
        let snapshot = Snapshot {
            entries: self
                .entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };
        bincode::serde::encode_into_std_write(
            &snapshot,
            &mut BufWriter::new(file),
            bincode::config::standard(),
        )
        .map_err(|e| EngineError::Codec(e.to_string()))?;
        Ok(())
    }

    /// Load a snapshot from `path`, overwriting any entries currently held.
    /// A missing file is treated as "nothing to load".
    pub fn import(&mut self, path: impl AsRef<Path>) -> EngineResult<()> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(EngineError::Snapshot(e.to_string())),
        };
        let snapshot: Snapshot = bincode::serde::decode_from_std_read(
            &mut BufReader::new(file),
            bincode::config::standard(),
        )
        .map_err(|e| EngineError::Codec(e.to_string()))?;
        self.entries = snapshot.entries.into_iter().collect();
        Ok(())
    }

    /// Release this table's in-memory state. Idempotent.
    pub fn destroy(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_returns_the_value() {
        let mut table = KvTable::create();
        table.put(b"alpha".to_vec(), b"one".to_vec()).unwrap();
        assert_eq!(table.get(b"alpha").unwrap(), Some(&b"one"[..]));
    }

    #[test]
    fn put_overwrites_an_existing_key() {
        let mut table = KvTable::create();
        table.put(b"alpha".to_vec(), b"one".to_vec()).unwrap();
        table.put(b"alpha".to_vec(), b"two".to_vec()).unwrap();
        assert_eq!(table.get(b"alpha").unwrap(), Some(&b"two"[..]));
    }

    #[test]
    fn put_then_del_then_get_is_not_found() {
        let mut table = KvTable::create();
        table.put(b"alpha".to_vec(), b"one".to_vec()).unwrap();
        table.del(b"alpha").unwrap();
        assert_eq!(table.get(b"alpha").unwrap(), None);
    }

    #[test]
    fn del_of_absent_key_is_a_no_op() {
        let mut table = KvTable::create();
        assert!(table.del(b"missing").is_ok());
        assert_eq!(table.size(), 0);
    }

    #[test]
    fn put_rejects_empty_key() {
        let mut table = KvTable::create();
        let err = table.put(Vec::new(), b"v".to_vec()).unwrap_err();
        assert!(matches!(err, EngineError::EmptyKey));
    }

    #[test]
    fn dump_then_load_restores_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.table");

        let mut table = KvTable::create();
        table.put(b"k1".to_vec(), b"v1".to_vec()).unwrap();
        table.put(b"k2".to_vec(), b"v2".to_vec()).unwrap();
        table.dump(&path).unwrap();

        let restored = KvTable::load(&path).unwrap();
        assert_eq!(restored.size(), 2);
        assert_eq!(restored.get(b"k1").unwrap(), Some(&b"v1"[..]));
    }

    #[test]
    fn load_of_missing_snapshot_yields_empty_table() {
        let table = KvTable::load("/nonexistent/db.table").unwrap();
        assert_eq!(table.size(), 0);
    }
}
