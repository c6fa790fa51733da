//! Question-to-chunk retrieval.

use std::sync::Arc;

use docqa_core::Credentials;
use tracing::{debug, info};

use crate::config::RagConfig;
use crate::document::SearchResult;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::index::VectorIndex;

/// Embeds a question and fetches the most relevant chunks from an index.
///
/// Chunks scoring below `similarity_threshold` are dropped, so an empty
/// result means nothing in the document is relevant enough to answer from.
#[derive(Clone)]
pub struct Retriever {
    provider: Arc<dyn EmbeddingProvider>,
    top_k: usize,
    similarity_threshold: f32,
}

impl Retriever {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        top_k: usize,
        similarity_threshold: f32,
    ) -> Self {
        Self { provider, top_k, similarity_threshold }
    }

    pub fn from_config(provider: Arc<dyn EmbeddingProvider>, config: &RagConfig) -> Self {
        Self::new(provider, config.top_k, config.similarity_threshold)
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn similarity_threshold(&self) -> f32 {
        self.similarity_threshold
    }

    /// Retrieve up to `top_k` chunks relevant to `question`.
    pub async fn retrieve(
        &self,
        index: &VectorIndex,
        question: &str,
        credentials: &Credentials,
    ) -> Result<Vec<SearchResult>> {
        let results = index.query(question, self.top_k, self.provider.as_ref(), credentials).await?;
        let candidates = results.len();
        let best_score = results.first().map(|r| r.score);

        let threshold = self.similarity_threshold;
        let filtered: Vec<SearchResult> =
            results.into_iter().filter(|r| r.score >= threshold).collect();

        debug!(candidates, ?best_score, threshold, "scored candidates");
        info!(result_count = filtered.len(), "retrieval completed");
        Ok(filtered)
    }
}
