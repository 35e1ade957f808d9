//! A brute-force vector index.
//!
//! `FlatIndex` is the only concrete backing for both `IndexKind::Flat` and
//! `IndexKind::Hnsw` — building an actual approximate nearest-neighbor graph
//! is out of scope here (see `DESIGN.md`). It stores vectors keyed by
//! caller-supplied id and scores every stored vector on every search, which
//! is exact but linear in the number of stored vectors.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Which index structure a vector engine was configured to use.
///
/// Only `Flat` is actually built; `Hnsw` is accepted for CLI/config
/// compatibility and falls back to the same brute-force backing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    Hnsw,
    Flat,
}

/// How two vectors are scored against each other.
///
/// `search` always reports a "distance" where lower means more similar,
/// regardless of which metric produced it: cosine similarity and dot
/// product are negated/complemented so their ordering matches L2's native
/// lower-is-better sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Similarity {
    /// `1 - cosine_similarity(a, b)`; 0 for identical direction.
    Cosine,
    /// `-dot(a, b)`; more negative means a larger dot product.
    Dotp,
    /// Euclidean distance, native lower-is-better.
    L2Norm,
}

impl Similarity {
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Similarity::Cosine => 1.0 - cosine_similarity(a, b),
            Similarity::Dotp => -dot(a, b),
            Similarity::L2Norm => l2(a, b),
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(a: &[f32]) -> f32 {
    dot(a, a).sqrt()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let denom = norm(a) * norm(b);
    if denom == 0.0 {
        0.0
    } else {
        dot(a, b) / denom
    }
}

fn l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    dims: u32,
    similarity: Similarity,
    entries: Vec<(u64, Vec<f32>)>,
}

/// An in-memory vector index over fixed-dimensional `f32` vectors.
#[derive(Debug)]
pub struct VectorIndex {
    kind: IndexKind,
    similarity: Similarity,
    dims: u32,
    vectors: BTreeMap<u64, Vec<f32>>,
}

impl VectorIndex {
    pub fn create(kind: IndexKind, similarity: Similarity, dims: u32) -> Self {
        Self {
            kind,
            similarity,
            dims,
            vectors: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn similarity(&self) -> Similarity {
        self.similarity
    }

    pub fn dims(&self) -> u32 {
        self.dims
    }

    fn check_dims(&self, vector: &[f32]) -> EngineResult<()> {
        let actual = vector.len() as u32;
        if actual != self.dims {
            return Err(EngineError::DimMismatch {
                expected: self.dims,
                actual,
            });
        }
        Ok(())
    }

    /// Insert `vector` under `id`. Fails deterministically if `id` is
    /// already present, so replaying the same WAL against a fresh index
    /// reproduces identical state rather than silently clobbering it.
    pub fn insert(&mut self, id: u64, vector: Vec<f32>) -> EngineResult<()> {
        self.check_dims(&vector)?;
        if self.vectors.contains_key(&id) {
            return Err(EngineError::IdExists(id));
        }
        self.vectors.insert(id, vector);
        Ok(())
    }

    /// Delete `id`. Deleting an absent id is a no-op, not an error — this
    /// is what makes WAL replay of a DELETE idempotent.
    pub fn delete(&mut self, id: u64) {
        self.vectors.remove(&id);
    }

    /// Return the `n` closest stored vectors to `query`, nearest first.
    pub fn search(&self, query: &[f32], n: u32) -> EngineResult<Vec<(u64, f32)>> {
        self.check_dims(query)?;
        let mut scored: Vec<(u64, f32)> = self
            .vectors
            .iter()
            .map(|(&id, v)| (id, self.similarity.distance(query, v)))
            .collect();
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(n as usize);
        Ok(scored)
    }

    pub fn size(&self) -> u64 {
        self.vectors.len() as u64
    }

    /// Write a complete snapshot of this index to `path`.
    pub fn export(&self, path: impl AsRef<Path>) -> EngineResult<()> {
        let file = File::create(path).map_err(|e| EngineError::Snapshot(e.to_string()))?;
        let snapshot = Snapshot {
            dims: self.dims,
            similarity: self.similarity,
            entries: self.vectors.iter().map(|(&id, v)| (id, v.clone())).collect(),
        };
        bincode::serde::encode_into_std_write(
            &snapshot,
            &mut BufWriter::new(file),
            bincode::config::standard(),
        )
        .map_err(|e| EngineError::Codec(e.to_string()))?;
        Ok(())
    }

    /// Load a snapshot from `path`, overwriting any vectors currently held.
    /// A missing file is treated as "nothing to load" (a fresh index).
    pub fn import(&mut self, path: impl AsRef<Path>) -> EngineResult<()> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(EngineError::Snapshot(e.to_string())),
        };
        let snapshot: Snapshot = bincode::serde::decode_from_std_read(
            &mut std::io::BufReader::new(file),
            bincode::config::standard(),
        )
        .map_err(|e| EngineError::Codec(e.to_string()))?;

        if snapshot.dims != self.dims {
            return Err(EngineError::DimMismatch {
                expected: self.dims,
                actual: snapshot.dims,
            });
        }
        self.vectors = snapshot.entries.into_iter().collect();
        Ok(())
    }

    /// Release this index's in-memory state. Idempotent.
    pub fn destroy(&mut self) {
        self.vectors.clear();
    }
}
