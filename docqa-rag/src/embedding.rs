//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;
use docqa_core::Credentials;

use crate::error::Result;

/// A provider that generates vector embeddings from text input.
///
/// Credentials are passed on every call; providers never store them. The
/// default [`embed_batch`](EmbeddingProvider::embed_batch) implementation
/// calls [`embed`](EmbeddingProvider::embed) sequentially; backends that
/// support native batching should override it.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::EmbeddingProvider;
///
/// let embedding = provider.embed("hello world", &credentials).await?;
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str, credentials: &Credentials) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs, in input order.
    async fn embed_batch(
        &self,
        texts: &[&str],
        credentials: &Credentials,
    ) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text, credentials).await?);
        }
        Ok(results)
    }
}
