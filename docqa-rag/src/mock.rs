//! Deterministic embedding provider for tests and offline demos.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docqa_core::{Credentials, ServiceError};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Words that carry no topical signal and are skipped when embedding.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "at", "be", "by", "did", "do", "does", "for", "how", "in", "is", "it",
    "of", "on", "that", "the", "this", "to", "was", "were", "what", "which", "who", "with",
];

/// Bag-of-words embeddings: each non-stopword token is hashed (FNV-1a) into
/// one of `dimensions` buckets.
///
/// Texts that share vocabulary get positive cosine similarity and texts with
/// disjoint vocabulary score 0, which makes retrieval behaviour predictable
/// without a network. Every embedded text increments [`calls`](Self::calls).
#[derive(Debug)]
pub struct KeywordEmbeddingProvider {
    dimensions: usize,
    calls: AtomicUsize,
    fail_with: Option<ServiceError>,
}

impl Default for KeywordEmbeddingProvider {
    fn default() -> Self {
        Self::new(256)
    }
}

impl KeywordEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.max(1), calls: AtomicUsize::new(0), fail_with: None }
    }

    /// A provider whose every call fails with `error`.
    pub fn failing(error: ServiceError) -> Self {
        Self { fail_with: Some(error), ..Self::default() }
    }

    /// Number of texts embedded so far, including failed attempts.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Compute the embedding without counting a call.
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        for token in tokens(text) {
            let bucket = (fnv1a(token.as_bytes()) % self.dimensions as u64) as usize;
            embedding[bucket] += 1.0;
        }
        embedding
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325u64, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbeddingProvider {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn embed(&self, text: &str, _credentials: &Credentials) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.fail_with {
            return Err(RagError::Embedding(error.clone()));
        }
        Ok(self.vector_for(text))
    }
}
