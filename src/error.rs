use std::path::PathBuf;

use thiserror::Error;

use crate::utils::sparse::SparseError;

/// Errors from loading a vectorizer and encoding documents.
#[derive(Debug, Error)]
pub enum EncoderError {
    /// The configured model artifact is missing.
    #[error("{} not found, cannot find a fitted tfidf_vectorizer", .0.display())]
    PretrainedModelFileDoesNotExist(PathBuf),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("invalid traversal path `{path}`: {reason}")]
    InvalidTraversalPath { path: String, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact exists but cannot be decoded or is inconsistent.
    #[error("invalid model artifact {}: {reason}", path.display())]
    ModelFormat { path: PathBuf, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    /// The vectorizer broke the one-row-per-text contract.
    #[error("vectorizer returned {got} rows for {expected} texts")]
    TransformMismatch { expected: usize, got: usize },

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Sparse(#[from] SparseError),
}

pub type Result<T, E = EncoderError> = std::result::Result<T, E>;
