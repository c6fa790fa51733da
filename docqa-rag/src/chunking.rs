//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`FixedSizeChunker`], a
//! sliding character window with a fixed overlap between neighbours.

use crate::config::RagConfig;
use crate::document::Chunk;

/// A strategy for splitting document text into chunks.
pub trait Chunker: Send + Sync {
    /// Split text into ordered chunks.
    ///
    /// Returns an empty `Vec` if the text is empty.
    fn chunk(&self, text: &str) -> Vec<Chunk>;
}

/// Splits text into fixed-size chunks by character count with a fixed overlap.
///
/// Windows start every `chunk_size - chunk_overlap` characters. The walk stops
/// at the first window that reaches the end of the text, so the last chunk may
/// be shorter than `chunk_size` but is never empty and never wholly contained
/// in its predecessor. Sizes are counted in `char`s, so multi-byte text is
/// never cut inside a character.
///
/// # Example
///
/// ```rust
/// use docqa_rag::{Chunker, FixedSizeChunker};
///
/// let chunker = FixedSizeChunker::new(10, 4);
/// let chunks = chunker.chunk("abcdefghijklmnop");
/// assert_eq!(chunks[0].text, "abcdefghij");
/// assert_eq!(chunks[1].text, "ghijklmnop");
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// `chunk_size` is clamped to at least 1 and `chunk_overlap` to below
    /// `chunk_size`; use [`RagConfig::validate`] to reject bad values instead.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size - 1) }
    }

    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every char boundary, plus the end of the text.
        let boundaries: Vec<usize> =
            text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        let char_len = boundaries.len() - 1;
        let step = self.chunk_size - self.chunk_overlap;

        let mut chunks = Vec::with_capacity(char_len / step + 1);
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(char_len);
            chunks.push(Chunk {
                index: chunks.len(),
                text: text[boundaries[start]..boundaries[end]].to_string(),
                char_offset: start,
            });
            if end == char_len {
                break;
            }
            start += step;
        }

        chunks
    }
}
