//! Error taxonomy for the core pipeline.
//!
//! Degenerate outcomes (no matches, unsupported query mode, empty
//! generation) are not errors; they surface as
//! [`QueryResponse`](crate::rag::QueryResponse) variants instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid parameters or missing credentials. Never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A remote strategy answered with a failure status, an unsupported
    /// body encoding, or could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RagError>;
