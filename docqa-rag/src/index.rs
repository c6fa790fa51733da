//! In-memory vector index with exact cosine similarity search.
//!
//! A [`VectorIndex`] holds one embedding per chunk of a single document. It is
//! immutable once built: [`VectorIndex::build`] always produces a fresh index,
//! so a failed build can never leave a half-populated index visible to
//! queries. Search is an exhaustive scan, which keeps rankings exact and
//! deterministic.

use std::cmp::Ordering;

use docqa_core::Credentials;
use rand::Rng;
use tracing::{debug, info};

use crate::document::{Chunk, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude, the lengths differ, or
/// the result is not a finite number.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let similarity = dot / (norm_a * norm_b);
    if similarity.is_finite() { similarity } else { 0.0 }
}

#[derive(Debug, Clone)]
struct IndexEntry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// Chunk and embedding pairs for one document, searchable by cosine similarity.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dimensions: usize,
}

impl VectorIndex {
    /// Embed every chunk in batches of `batch_size` and build a new index.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] if any embedding request fails and
    /// [`RagError::IndexBuild`] if the provider returns the wrong number of
    /// vectors or vectors of inconsistent dimension.
    pub async fn build(
        chunks: Vec<Chunk>,
        provider: &dyn EmbeddingProvider,
        credentials: &Credentials,
        batch_size: usize,
    ) -> Result<Self> {
        let batch_size = batch_size.max(1);
        let mut embeddings = Vec::with_capacity(chunks.len());

        for (batch_no, batch) in chunks.chunks(batch_size).enumerate() {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let vectors = provider.embed_batch(&texts, credentials).await?;
            if vectors.len() != texts.len() {
                return Err(RagError::IndexBuild(format!(
                    "{} returned {} embeddings for a batch of {}",
                    provider.name(),
                    vectors.len(),
                    texts.len()
                )));
            }
            debug!(
                provider = provider.name(),
                batch_no,
                batch_size = texts.len(),
                "embedded batch"
            );
            embeddings.extend(vectors);
        }

        let index = Self::from_entries(chunks.into_iter().zip(embeddings).collect())?;
        info!(chunk_count = index.len(), dimensions = index.dimensions, "vector index built");
        Ok(index)
    }

    /// Build an index from chunks that already have embeddings.
    ///
    /// Entries are stored in chunk index order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexBuild`] if the embeddings do not all share one
    /// non-zero dimension.
    pub fn from_entries(pairs: Vec<(Chunk, Vec<f32>)>) -> Result<Self> {
        let dimensions = pairs.first().map(|(_, e)| e.len()).unwrap_or(0);
        if !pairs.is_empty() && dimensions == 0 {
            return Err(RagError::IndexBuild("embedding provider returned empty vectors".into()));
        }
        if let Some((chunk, embedding)) = pairs.iter().find(|(_, e)| e.len() != dimensions) {
            return Err(RagError::IndexBuild(format!(
                "chunk {} has {} dimensions, expected {dimensions}",
                chunk.index,
                embedding.len()
            )));
        }

        let mut entries: Vec<IndexEntry> =
            pairs.into_iter().map(|(chunk, embedding)| IndexEntry { chunk, embedding }).collect();
        entries.sort_by_key(|e| e.chunk.index);
        Ok(Self { entries, dimensions })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimensionality of the stored embeddings, 0 for an empty index.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Stored chunks in document order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }

    /// Embed `text` and return its `k` nearest chunks.
    pub async fn query(
        &self,
        text: &str,
        k: usize,
        provider: &dyn EmbeddingProvider,
        credentials: &Credentials,
    ) -> Result<Vec<SearchResult>> {
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }
        let embedding = provider.embed(text, credentials).await?;
        Ok(self.search(&embedding, k))
    }

    /// Return the `k` chunks most similar to `embedding`.
    ///
    /// Results are ordered by descending score; equal scores keep document
    /// order (lower chunk index first).
    pub fn search(&self, embedding: &[f32], k: usize) -> Vec<SearchResult> {
        if k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (pos, cosine_similarity(&entry.embedding, embedding)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(pos, score)| SearchResult { chunk: self.entries[pos].chunk.clone(), score })
            .collect()
    }

    /// Uniformly sample up to `n` distinct chunks, returned in document order.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<Chunk> {
        let amount = n.min(self.entries.len());
        let mut positions = rand::seq::index::sample(rng, self.entries.len(), amount).into_vec();
        positions.sort_unstable();
        positions.into_iter().map(|pos| self.entries[pos].chunk.clone()).collect()
    }
}
