//! The two storage engines VictorDB's dispatchers sit on top of.
//!
//! Neither engine is the focus of this crate: `vector` and `table` each
//! provide the narrowest concrete implementation that satisfies the
//! collaborator contracts the dispatchers depend on (insert/delete/search
//! for vectors, put/get/del for keys), so the rest of the system has
//! something real to drive. `FlatIndex` is the only backing for both the
//! `flat` and `hnsw` index kinds — approximate graph search itself is not
//! implemented, see `DESIGN.md`.

pub mod error;
pub mod table;
pub mod vector;

pub use error::{EngineError, EngineResult};
pub use table::KvTable;
pub use vector::{IndexKind, Similarity, VectorIndex};
