//! Error types for the `docqa-rag` crate.

use docqa_core::ServiceError;
use thiserror::Error;

/// Errors that can occur in ingestion and retrieval.
#[derive(Debug, Error)]
pub enum RagError {
    /// The payload is not a readable document, is too large, or contains no text.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// The embedding service failed.
    #[error("Embedding error: {0}")]
    Embedding(#[from] ServiceError),

    /// The index could not be built from the document's chunks.
    #[error("Index build error: {0}")]
    IndexBuild(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RagError {
    /// The underlying service failure, if this error came from an external call.
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            RagError::Embedding(e) => Some(e),
            _ => None,
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
