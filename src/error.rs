//! Error type shared by the store, the indexes and the engine.

use crate::store::RecordId;
use thiserror::Error;

/// Everything that can go wrong in annvec.
///
/// Validation errors are raised before any state is touched, so a failed
/// call never leaves a half-applied insert behind.
#[derive(Debug, Error)]
pub enum VecError {
    /// A record with this id is already stored.
    #[error("duplicate id: {0}")]
    DuplicateId(RecordId),

    /// No record with this id.
    #[error("id not found: {0}")]
    NotFound(RecordId),

    /// Vector length differs from the store dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Query issued before anything was inserted.
    #[error("index is empty")]
    EmptyIndex,

    #[error("dimension must be at least 1")]
    InvalidDimension,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read config: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("unsupported snapshot format version {0}")]
    UnsupportedFormat(u32),
}

impl From<bincode::Error> for VecError {
    fn from(err: bincode::Error) -> Self {
        VecError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VecError>;
