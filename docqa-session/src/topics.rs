//! Topic suggestion from sampled document content.
//!
//! Suggestions are an enhancement: [`TopicSuggester::suggest`] never fails,
//! it logs and returns an empty list instead.

use std::collections::HashSet;
use std::sync::Arc;

use docqa_core::Credentials;
use docqa_model::{GenerationRequest, Llm};
use docqa_rag::{Chunk, VectorIndex};
use tracing::{debug, info, warn};

use crate::config::TopicConfig;

/// Samples chunks from an index and asks the model for questions about them.
#[derive(Clone)]
pub struct TopicSuggester {
    llm: Arc<dyn Llm>,
    sample_size: usize,
    min_suggestions: usize,
    max_suggestions: usize,
}

impl TopicSuggester {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self::from_config(llm, &TopicConfig::default())
    }

    pub fn from_config(llm: Arc<dyn Llm>, config: &TopicConfig) -> Self {
        Self {
            llm,
            sample_size: config.sample_size,
            min_suggestions: config.min_suggestions,
            max_suggestions: config.max_suggestions,
        }
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn max_suggestions(&self) -> usize {
        self.max_suggestions
    }

    /// Suggest questions answerable from `index`.
    ///
    /// Returns an empty list if the index is empty or the model call fails.
    pub async fn suggest(&self, index: &VectorIndex, credentials: &Credentials) -> Vec<String> {
        let sample = index.sample(self.sample_size, &mut rand::thread_rng());
        self.suggest_from(&sample, credentials).await
    }

    /// Suggest questions answerable from the given chunks.
    pub async fn suggest_from(&self, chunks: &[Chunk], credentials: &Credentials) -> Vec<String> {
        if chunks.is_empty() {
            return Vec::new();
        }

        let prompt = self.build_prompt(chunks);
        debug!(
            model = self.llm.name(),
            sampled = chunks.len(),
            prompt_len = prompt.len(),
            "requesting topic suggestions"
        );

        let request = GenerationRequest::from_prompt(prompt);
        let raw = match self.llm.generate(request, credentials).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(model = self.llm.name(), error = %e, "topic suggestion failed");
                return Vec::new();
            }
        };

        let suggestions = parse_suggestions(&raw, self.max_suggestions);
        if suggestions.len() < self.min_suggestions {
            warn!(
                count = suggestions.len(),
                min = self.min_suggestions,
                "model returned fewer suggestions than requested"
            );
        }
        info!(count = suggestions.len(), "topic suggestions generated");
        suggestions
    }

    fn build_prompt(&self, chunks: &[Chunk]) -> String {
        let excerpts = chunks
            .iter()
            .map(|c| c.text.trim())
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");
        format!(
            "Below are excerpts from a PDF document.

Write between {min} and {max} short questions a reader could ask about this document. \
Every question must be answerable from the excerpts alone.
Put each question on its own line. Do not number the questions, add bullets, or write anything else.

Excerpts:
{excerpts}

Questions:",
            min = self.min_suggestions,
            max = self.max_suggestions,
        )
    }
}

/// Turn a free-text model reply into a clean list of at most `max` questions.
///
/// Strips bullets, numbering and wrapping quotes, drops lines without any
/// alphanumeric content and preamble lines ending in `:`, and removes
/// case-insensitive duplicates, keeping the first occurrence.
pub fn parse_suggestions(text: &str, max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut suggestions = Vec::new();

    for line in text.lines() {
        if suggestions.len() == max {
            break;
        }
        let cleaned = clean_line(line);
        if !cleaned.chars().any(char::is_alphanumeric) || cleaned.ends_with(':') {
            continue;
        }
        if seen.insert(cleaned.to_lowercase()) {
            suggestions.push(cleaned);
        }
    }

    suggestions
}

fn clean_line(line: &str) -> String {
    let mut rest = line.trim();
    // Markers can stack, e.g. "- 1. ..."
    loop {
        let stripped = strip_marker(rest).trim_start();
        if stripped.len() == rest.len() {
            break;
        }
        rest = stripped;
    }
    let rest = rest.trim_matches(|c: char| matches!(c, '"' | '\'' | '“' | '”' | '*' | '`')).trim();
    rest.to_string()
}

fn strip_marker(s: &str) -> &str {
    if let Some(rest) = s.strip_prefix(['-', '*', '•', '+']) {
        return rest;
    }

    // Q1: / Q1. / Q1)
    if let Some(rest) = s.strip_prefix(['Q', 'q']) {
        if let Some(after) = strip_number_with_suffix(rest, &[':', '.', ')']) {
            return after;
        }
    }

    // (1)
    if let Some(rest) = s.strip_prefix('(') {
        if let Some(after) = strip_number_with_suffix(rest, &[')']) {
            return after;
        }
    }

    // 1. / 1) / 1: / 1 -
    strip_number_with_suffix(s, &['.', ')', ':']).unwrap_or(s)
}

/// Strip a leading number followed by one of `suffixes` (or a spaced dash).
///
/// The marker must be followed by whitespace or end the line, so "1.5 million"
/// keeps its number.
fn strip_number_with_suffix<'a>(s: &'a str, suffixes: &[char]) -> Option<&'a str> {
    let digits = s.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = &s[digits..];
    if let Some(after) = rest.strip_prefix(suffixes) {
        return ends_marker(after).then_some(after);
    }

    let spaced = rest.trim_start();
    if spaced.len() == rest.len() {
        return None;
    }
    spaced.strip_prefix(['-', '–']).filter(|after| ends_marker(after))
}

fn ends_marker(after: &str) -> bool {
    after.is_empty() || after.starts_with(char::is_whitespace)
}
