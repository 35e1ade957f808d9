use thiserror::Error;

/// Engine-level failures, translated by the dispatcher into `ERROR`/`OP_RESULT`
/// status codes rather than propagated as exceptions.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("vector id {0} already exists")]
    IdExists(u64),

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimMismatch { expected: u32, actual: u32 },

    #[error("empty key is not allowed")]
    EmptyKey,

    #[error("snapshot I/O error: {0}")]
    Snapshot(String),

    #[error("snapshot codec error: {0}")]
    Codec(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Maps an engine failure to the status code carried in an `ERROR` or
    /// non-zero `OP_RESULT`/typed-result reply.
    pub fn code(&self) -> u32 {
        match self {
            EngineError::IdExists(_) => common::codes::VECTOR_ID_EXISTS,
            EngineError::DimMismatch { .. } => common::codes::VECTOR_DIM_MISMATCH,
            EngineError::EmptyKey => common::codes::BAD_REQUEST,
            EngineError::Snapshot(_) | EngineError::Codec(_) => common::codes::INTERNAL,
        }
    }
}
