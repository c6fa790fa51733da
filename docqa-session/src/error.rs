//! Error types for the `docqa-session` crate.

use docqa_core::{FailureKind, ServiceError};
use docqa_rag::RagError;
use thiserror::Error;

/// Structured failures returned by session operations.
///
/// The "I am not sure." sentinel is never an error: it is a successful
/// [`Answer`](crate::Answer). Everything here is a system-level failure.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The upload is not declared as a PDF.
    #[error("Unsupported upload '{filename}': only PDF documents are accepted")]
    UnsupportedContentType {
        filename: String,
        content_type: Option<String>,
    },

    /// The payload could not be read as a document. The session is unchanged.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// The document was readable but produced no chunks.
    #[error("Document contains no text to index")]
    EmptyDocument,

    /// The question was empty or whitespace.
    #[error("Question must not be empty")]
    EmptyQuestion,

    /// A question arrived before any document was uploaded.
    #[error("No document loaded; upload a PDF first")]
    NoDocument,

    /// Lazy index build failed; the session stays in `DocumentLoaded`.
    #[error("Index build failed: {0}")]
    IndexBuild(#[source] RagError),

    /// Embedding the question failed.
    #[error("Embedding error: {0}")]
    Embedding(#[source] ServiceError),

    /// The generation model failed.
    #[error("Generation error: {0}")]
    Generation(#[source] ServiceError),

    /// The document was replaced or cleared while the request was running.
    #[error("Document changed while the request was in flight")]
    DocumentChanged,

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SessionError {
    /// The external-service failure behind this error, if any.
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            SessionError::Embedding(e) | SessionError::Generation(e) => Some(e),
            SessionError::IndexBuild(e) => e.service_error(),
            _ => None,
        }
    }

    /// Whether the failure was caused by invalid credentials.
    pub fn is_auth(&self) -> bool {
        self.service_error().is_some_and(|e| e.kind == FailureKind::Auth)
    }

    /// Whether repeating the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::DocumentChanged)
            || self.service_error().is_some_and(ServiceError::is_retryable)
    }
}

impl From<RagError> for SessionError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Extraction(message) => SessionError::Extraction(message),
            RagError::Embedding(e) => SessionError::Embedding(e),
            RagError::Config(message) => SessionError::Config(message),
            e @ RagError::IndexBuild(_) => SessionError::IndexBuild(e),
        }
    }
}

/// A convenience result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
