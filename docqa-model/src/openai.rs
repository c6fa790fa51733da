//! OpenAI chat-completions client.
//!
//! Talks to `/chat/completions` with `reqwest`, so it also works against
//! OpenAI-compatible servers (Ollama, vLLM, LM Studio) via
//! [`OpenAIClient::with_base_url`].

use std::time::Duration;

use async_trait::async_trait;
use docqa_core::{Credentials, OPENAI_API_BASE, RetryConfig, ServiceError, with_retry};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::llm::{GenerationRequest, Llm, Message, Result};

const SERVICE: &str = "OpenAI chat";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// OpenAI client for the standard API and OpenAI-compatible APIs.
pub struct OpenAIClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    retry: RetryConfig,
}

impl OpenAIClient {
    /// Create a client for `model` on the public OpenAI API.
    pub fn new(model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: OPENAI_API_BASE.to_string(),
            model: model.into(),
            retry: RetryConfig::default(),
        }
    }

    /// Point the client at an OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the retry policy for transient failures.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn complete_once(
        &self,
        request: &GenerationRequest,
        credentials: &Credentials,
    ) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(credentials.api_key())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "chat request failed");
                ServiceError::from_transport(SERVICE, &e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            error!(model = %self.model, %status, "chat API error");
            return Err(ServiceError::from_status(SERVICE, status.as_u16(), detail));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            ServiceError::rejected(SERVICE, format!("failed to parse response: {e}"))
        })?;

        first_choice_text(parsed)
    }
}

fn first_choice_text(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| ServiceError::rejected(SERVICE, "response contained no choices"))
}

// ── OpenAI API request/response types ──────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[async_trait]
impl Llm for OpenAIClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        request: GenerationRequest,
        credentials: &Credentials,
    ) -> Result<String> {
        if credentials.is_empty() {
            return Err(ServiceError::auth(SERVICE, "API key must not be empty"));
        }

        debug!(
            model = %self.model,
            messages = request.messages.len(),
            prompt_len = request.prompt_len(),
            "generating completion"
        );

        with_retry(&self.retry, || self.complete_once(&request, credentials)).await
    }
}
