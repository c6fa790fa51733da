//! Mock LLM for testing.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use docqa_core::{Credentials, ServiceError};

use crate::llm::{GenerationRequest, Llm, Result};

/// A scripted [`Llm`] that records every request it receives.
///
/// Queued responses are returned in order; once the queue is empty the
/// fallback response is returned for every further call.
#[derive(Debug)]
pub struct MockLlm {
    name: String,
    queued: Mutex<VecDeque<Result<String>>>,
    fallback: Result<String>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockLlm {
    /// A mock that always answers `response`.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            name: "mock-llm".to_string(),
            queued: Mutex::new(VecDeque::new()),
            fallback: Ok(response.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A mock whose every call fails with `error`.
    pub fn failing(error: ServiceError) -> Self {
        Self { fallback: Err(error), ..Self::new("") }
    }

    /// Queue a response to be returned before the fallback.
    pub fn then(self, response: Result<String>) -> Self {
        if let Ok(mut queued) = self.queued.lock() {
            queued.push_back(response);
        }
        self
    }

    /// Number of `generate` calls made so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// All requests received so far, oldest first.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Text of the last message of the most recent request.
    pub fn last_prompt(&self) -> Option<String> {
        self.requests
            .lock()
            .ok()
            .and_then(|r| r.last().and_then(|req| req.messages.last()).map(|m| m.content.clone()))
    }
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        request: GenerationRequest,
        _credentials: &Credentials,
    ) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        let next = self.queued.lock().ok().and_then(|mut q| q.pop_front());
        next.unwrap_or_else(|| self.fallback.clone())
    }
}
