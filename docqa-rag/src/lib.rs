//! # docqa-rag
//!
//! The retrieval half of docqa: turn one uploaded document into searchable
//! chunks and find the chunks relevant to a question.
//!
//! - [`PdfTextExtractor`] - ordered text from PDF bytes
//! - [`FixedSizeChunker`] - overlapping fixed-size character windows
//! - [`EmbeddingProvider`] - text to vector, with an OpenAI implementation
//! - [`VectorIndex`] - exact cosine search over one document's chunks
//! - [`Retriever`] - question to top-k chunks above a relevance threshold
//! - [`KeywordEmbeddingProvider`] - deterministic offline embeddings for tests
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `openai` | [`OpenAIEmbeddingProvider`] (enabled by default) |

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod index;
pub mod mock;
pub mod retriever;

#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{Chunker, FixedSizeChunker};
pub use config::{
    DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TOP_K,
    RagConfig, RagConfigBuilder,
};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use extract::{ExtractedText, PDF_CONTENT_TYPE, PdfTextExtractor, TextExtractor, is_pdf_upload};
pub use index::{VectorIndex, cosine_similarity};
pub use mock::KeywordEmbeddingProvider;
pub use retriever::Retriever;

#[cfg(feature = "openai")]
pub use openai::OpenAIEmbeddingProvider;
