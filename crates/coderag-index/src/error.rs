//! Error types for coderag-index.

use std::path::PathBuf;

/// Errors that can occur during indexing and retrieval.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// IO error reading sources or writing the store.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider error (embedding or chat).
    #[error("LLM error: {0}")]
    Llm(#[from] coderag_llm::LlmError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Tree-sitter parsing or symbol introspection error.
    #[error("parse failed: {0}")]
    Parse(String),

    /// No persisted index for the requested codebase.
    #[error("no index for codebase `{codebase}`: {} not found", path.display())]
    NotFound { codebase: String, path: PathBuf },

    /// A vector does not have the index dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },

    /// A batch handed to the store pairs unequal numbers of records and vectors.
    #[error("batch mismatch: {records} records for {vectors} vectors")]
    BatchMismatch { records: usize, vectors: usize },

    /// Embedding batch came back unusable.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// Persisted index file is unreadable.
    #[error("corrupt index file: {0}")]
    CorruptIndex(String),
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
