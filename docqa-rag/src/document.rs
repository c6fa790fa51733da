//! Data types for documents, chunks, and search results.

use serde::{Deserialize, Serialize};

/// An uploaded document and the text extracted from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// The filename the document was uploaded under.
    pub filename: String,
    /// Declared content type of the upload, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Size of the raw payload in bytes.
    pub byte_len: usize,
    /// Number of pages the text was extracted from.
    pub page_count: usize,
    /// Plain text of the whole document, pages in order.
    pub text: String,
}

/// An ordered, immutable segment of a [`Document`]'s text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Position of the chunk within the document, starting at 0.
    pub index: usize,
    /// The text content of the chunk.
    pub text: String,
    /// Character offset of the chunk's first character in the document text.
    pub char_offset: usize,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The cosine similarity score (higher is more relevant).
    pub score: f32,
}
