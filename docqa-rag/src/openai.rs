//! OpenAI embedding provider using the OpenAI embeddings API.
//!
//! This module is only available when the `openai` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use docqa_core::{
    Credentials, DEFAULT_EMBEDDING_MODEL, OPENAI_API_BASE, RetryConfig, ServiceError, with_retry,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

const SERVICE: &str = "OpenAI embeddings";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// An [`EmbeddingProvider`] backed by the OpenAI embeddings API.
///
/// Uses `reqwest` to call the `/embeddings` endpoint directly. Transient
/// failures (rate limits, timeouts, 5xx) are retried according to the
/// configured [`RetryConfig`]; auth failures are returned immediately.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::openai::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::new();
/// let embedding = provider.embed("hello world", &Credentials::new("sk-...")).await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    retry: RetryConfig,
}

impl Default for OpenAIEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAIEmbeddingProvider {
    /// Create a provider for `text-embedding-3-small` on the public API.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: OPENAI_API_BASE.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            retry: RetryConfig::default(),
        }
    }

    /// Set the model name (e.g. `text-embedding-3-large`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the provider at an OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the retry policy for transient failures.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn request_once(
        &self,
        texts: &[&str],
        credentials: &Credentials,
    ) -> std::result::Result<Vec<Vec<f32>>, ServiceError> {
        let request_body = EmbeddingRequest { model: &self.model, input: texts };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(credentials.api_key())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "OpenAI", error = %e, "request failed");
                ServiceError::from_transport(SERVICE, &e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(provider = "OpenAI", %status, "embeddings API error");
            return Err(ServiceError::from_status(SERVICE, status.as_u16(), detail));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = "OpenAI", error = %e, "failed to parse response");
            ServiceError::rejected(SERVICE, format!("failed to parse response: {e}"))
        })?;

        order_embeddings(parsed.data, texts.len())
    }
}

/// Put embeddings back into input order using the `index` field of each item.
fn order_embeddings(
    data: Vec<EmbeddingData>,
    expected: usize,
) -> std::result::Result<Vec<Vec<f32>>, ServiceError> {
    if data.len() != expected {
        return Err(ServiceError::rejected(
            SERVICE,
            format!("API returned {} embeddings for {expected} inputs", data.len()),
        ));
    }
    let mut ordered: Vec<Option<Vec<f32>>> = vec![None; expected];
    for item in data {
        let slot = ordered.get_mut(item.index).ok_or_else(|| {
            ServiceError::rejected(SERVICE, format!("embedding index {} out of range", item.index))
        })?;
        *slot = Some(item.embedding);
    }
    ordered
        .into_iter()
        .map(|e| e.ok_or_else(|| ServiceError::rejected(SERVICE, "duplicate embedding index")))
        .collect()
}

// ── OpenAI API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn embed(&self, text: &str, credentials: &Credentials) -> Result<Vec<f32>> {
        debug!(provider = "OpenAI", text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text], credentials).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| {
                RagError::Embedding(ServiceError::rejected(SERVICE, "API returned empty response"))
            })
    }

    async fn embed_batch(
        &self,
        texts: &[&str],
        credentials: &Credentials,
    ) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if credentials.is_empty() {
            let error = ServiceError::auth(SERVICE, "API key must not be empty");
            return Err(RagError::Embedding(error));
        }

        debug!(
            provider = "OpenAI",
            batch_size = texts.len(),
            model = %self.model,
            "embedding batch"
        );

        let embeddings = with_retry(&self.retry, || self.request_once(texts, credentials)).await?;
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(index: usize, value: f32) -> EmbeddingData {
        EmbeddingData { index, embedding: vec![value] }
    }

    #[test]
    fn reorders_by_api_index() {
        let ordered = order_embeddings(vec![item(1, 1.0), item(0, 0.0), item(2, 2.0)], 3).unwrap();
        assert_eq!(ordered, vec![vec![0.0], vec![1.0], vec![2.0]]);
    }

    #[test]
    fn count_mismatch_is_rejected() {
        let err = order_embeddings(vec![item(0, 0.0)], 2).unwrap_err();
        assert_eq!(err.kind, docqa_core::FailureKind::Rejected);
    }

    #[test]
    fn duplicate_index_is_rejected() {
        let err = order_embeddings(vec![item(0, 0.0), item(0, 1.0)], 2).unwrap_err();
        assert!(err.message.contains("duplicate"));
    }

    #[tokio::test]
    async fn empty_key_fails_as_auth_without_network() {
        let provider = OpenAIEmbeddingProvider::new().with_base_url("http://127.0.0.1:9");
        let err = provider.embed_batch(&["text"], &Credentials::new("")).await.unwrap_err();
        assert!(err.service_error().is_some_and(|e| e.is_auth()));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider = OpenAIEmbeddingProvider::new().with_base_url("http://localhost:8080/v1/");
        assert_eq!(provider.base_url, "http://localhost:8080/v1");
    }
}
