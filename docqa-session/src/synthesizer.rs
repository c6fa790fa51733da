//! Context-constrained answer synthesis.
//!
//! The model only ever sees the retrieved chunks. When retrieval comes back
//! empty the model is not called at all and the sentinel answer is returned.

use std::sync::Arc;

use docqa_core::Credentials;
use docqa_model::{GenerationRequest, Llm};
use docqa_rag::SearchResult;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::GenerationConfig;
use crate::error::{Result, SessionError};

/// The exact answer given when the document does not contain the answer.
pub const NOT_SURE_ANSWER: &str = "I am not sure.";

const CHUNK_SEPARATOR: &str = "\n\n";

/// An answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    /// Number of chunks placed in the prompt. Zero for the sentinel short-circuit.
    pub sources_used: usize,
}

impl Answer {
    /// The sentinel answer, produced without consulting the model.
    pub fn not_sure() -> Self {
        Self { answer: NOT_SURE_ANSWER.to_string(), sources_used: 0 }
    }

    pub fn is_not_sure(&self) -> bool {
        self.answer == NOT_SURE_ANSWER
    }
}

/// Builds the grounded prompt, calls the model and enforces the sentinel.
#[derive(Clone)]
pub struct AnswerSynthesizer {
    llm: Arc<dyn Llm>,
    temperature: f32,
    max_tokens: Option<u32>,
    max_context_chars: usize,
}

impl AnswerSynthesizer {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self::from_config(llm, &GenerationConfig::default())
    }

    pub fn from_config(llm: Arc<dyn Llm>, config: &GenerationConfig) -> Self {
        Self {
            llm,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_context_chars: config.max_context_chars,
        }
    }

    pub fn llm(&self) -> &Arc<dyn Llm> {
        &self.llm
    }

    pub fn max_context_chars(&self) -> usize {
        self.max_context_chars
    }

    /// Answer `question` from `results`, which are ordered best first.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Generation`] if the model call fails.
    pub async fn synthesize(
        &self,
        question: &str,
        results: &[SearchResult],
        credentials: &Credentials,
    ) -> Result<Answer> {
        let context = fit_context(results, self.max_context_chars);
        if context.is_empty() {
            info!("no relevant context, answering with sentinel");
            return Ok(Answer::not_sure());
        }

        let sources_used = context.len();
        let prompt = build_prompt(&context, question);
        debug!(
            model = self.llm.name(),
            sources_used,
            prompt_len = prompt.len(),
            "synthesizing answer"
        );

        let request = GenerationRequest::from_prompt(prompt)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let raw = self.llm.generate(request, credentials).await.map_err(|e| {
            error!(model = self.llm.name(), error = %e, "answer generation failed");
            SessionError::Generation(e)
        })?;

        let answer = normalize_answer(&raw);
        info!(sources_used, not_sure = answer == NOT_SURE_ANSWER, "answer generated");
        Ok(Answer { answer, sources_used })
    }
}

/// Select chunk texts in rank order while their joined length stays within
/// `max_chars`.
///
/// The best chunk is always kept, truncated to `max_chars` if it alone is
/// longer. Lengths are counted in characters.
pub fn fit_context(results: &[SearchResult], max_chars: usize) -> Vec<String> {
    let mut selected: Vec<String> = Vec::new();
    let mut used = 0;

    for result in results {
        let text = result.chunk.text.as_str();
        let len = text.chars().count();

        if selected.is_empty() {
            if len > max_chars {
                selected.push(text.chars().take(max_chars).collect());
                break;
            }
            selected.push(text.to_string());
            used = len;
            continue;
        }

        let needed = CHUNK_SEPARATOR.len() + len;
        if used + needed > max_chars {
            break;
        }
        selected.push(text.to_string());
        used += needed;
    }

    selected
}

/// Render the grounded prompt for `question` over `context`.
pub fn build_prompt(context: &[String], question: &str) -> String {
    let context = context.join(CHUNK_SEPARATOR);
    format!(
        "You are a helpful assistant that answers questions based ONLY on the provided context \
from a PDF document.

IMPORTANT RULES:
1. Only answer based on the information provided in the context below
2. If the question cannot be answered from the context, respond with exactly: \"{NOT_SURE_ANSWER}\"
3. Do not use your general knowledge or training data
4. Be concise and direct in your answers
5. Do not mention that you are limited to the context

Context from PDF:
{context}

Question: {question}

Answer:"
    )
}

/// Trim the model's reply and collapse every variant of the sentinel to the
/// exact sentinel string. An empty reply also becomes the sentinel.
pub fn normalize_answer(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed.trim_matches(|c: char| matches!(c, '"' | '\'' | '“' | '”' | '`')).trim();
    let bare = unquoted.trim_end_matches('.').trim();

    if bare.is_empty() || bare.eq_ignore_ascii_case("i am not sure") {
        NOT_SURE_ANSWER.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::ServiceError;
    use docqa_model::MockLlm;
    use docqa_rag::Chunk;

    fn result(index: usize, text: &str, score: f32) -> SearchResult {
        SearchResult { chunk: Chunk { index, text: text.to_string(), char_offset: 0 }, score }
    }

    #[test]
    fn sentinel_variants_normalize() {
        let variants =
            ["I am not sure.", "i am not sure", "  \"I am not sure.\" ", "I AM NOT SURE..", ""];
        for raw in variants {
            assert_eq!(normalize_answer(raw), NOT_SURE_ANSWER, "raw = {raw:?}");
        }
        assert_eq!(normalize_answer("  Paris.  "), "Paris.");
        let hedged = "I am not sure it rains in Paris.";
        assert_eq!(normalize_answer(hedged), hedged);
    }

    #[test]
    fn prompt_contains_rules_context_and_question() {
        let prompt = build_prompt(&["alpha".into(), "beta".into()], "What is alpha?");
        assert!(prompt.contains("respond with exactly: \"I am not sure.\""));
        assert!(prompt.contains("Context from PDF:\nalpha\n\nbeta\n\nQuestion: What is alpha?"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn context_budget_keeps_rank_order_and_stops_at_limit() {
        let results = vec![
            result(4, &"a".repeat(10), 0.9),
            result(1, &"b".repeat(10), 0.8),
            result(2, "c", 0.7),
        ];
        // 10 + 2 + 10 = 22 fits, + 2 + 1 would be 25
        let context = fit_context(&results, 22);
        assert_eq!(context, vec!["a".repeat(10), "b".repeat(10)]);
    }

    #[test]
    fn oversized_top_chunk_is_truncated_not_dropped() {
        let results = vec![result(0, "héllo wörld", 0.9), result(1, "x", 0.8)];
        let context = fit_context(&results, 5);
        assert_eq!(context, vec!["héllo".to_string()]);
    }

    #[tokio::test]
    async fn empty_retrieval_short_circuits() {
        let llm = Arc::new(MockLlm::new("Paris"));
        let synthesizer = AnswerSynthesizer::new(llm.clone());

        let answer =
            synthesizer.synthesize("Anything?", &[], &Credentials::new("k")).await.unwrap();

        assert_eq!(answer, Answer::not_sure());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn counts_sources_placed_in_prompt() {
        let llm = Arc::new(MockLlm::new("Paris is the capital."));
        let synthesizer = AnswerSynthesizer::new(llm.clone());
        let results = vec![result(0, "The capital of France is Paris.", 0.9)];

        let answer =
            synthesizer.synthesize("Capital?", &results, &Credentials::new("k")).await.unwrap();

        assert_eq!(answer.sources_used, 1);
        assert_eq!(answer.answer, "Paris is the capital.");
        let request = &llm.requests()[0];
        assert_eq!(request.temperature, Some(0.0));
        assert!(request.messages[0].content.contains("The capital of France is Paris."));
    }

    #[tokio::test]
    async fn model_failure_is_generation_error() {
        let llm = Arc::new(MockLlm::failing(ServiceError::auth("OpenAI chat", "invalid key")));
        let synthesizer = AnswerSynthesizer::new(llm);
        let results = vec![result(0, "text", 0.9)];

        let err = synthesizer.synthesize("q", &results, &Credentials::new("k")).await.unwrap_err();
        assert!(matches!(err, SessionError::Generation(_)));
        assert!(err.is_auth());
    }
}
