use std::path::PathBuf;

use thiserror::Error;

/// Failure taxonomy shared by every docrag crate.
///
/// None of these are retried internally. Ingestion is idempotent per
/// document, so callers may retry a failed `ingest` wholesale.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller misuse: invalid chunk_size/overlap/k/batch_size, bad config file,
    /// missing credentials.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A single document could not be opened or parsed.
    #[error("Failed to read document {}: {reason}", path.display())]
    DocumentRead { path: PathBuf, reason: String },

    #[error("Embedding provider failed: {0}")]
    EmbeddingProvider(String),

    /// Vector store unavailable or write rejected.
    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Generation failed: {0}")]
    Generation(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self { Self::Configuration(msg.into()) }

    pub fn document_read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::DocumentRead { path: path.into(), reason: reason.to_string() }
    }

    pub fn embedding(reason: impl ToString) -> Self { Self::EmbeddingProvider(reason.to_string()) }

    pub fn index(reason: impl ToString) -> Self { Self::Index(reason.to_string()) }

    pub fn generation(reason: impl ToString) -> Self { Self::Generation(reason.to_string()) }

    /// Document-local failures that a multi-document run should skip.
    pub fn is_document_local(&self) -> bool { matches!(self, Self::DocumentRead { .. }) }
}

pub type Result<T> = std::result::Result<T, Error>;
