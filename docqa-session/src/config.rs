//! Configuration for docqa sessions.
//!
//! Uses `figment` for layered configuration: built-in defaults, then an
//! optional TOML file, then `DOCQA_`-prefixed environment variables
//! (`DOCQA_RAG__TOP_K=5`, `DOCQA_GENERATION__CHAT_MODEL=gpt-4o`, ...).

use std::path::Path;

use docqa_core::{DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL, OPENAI_API_BASE, RetryConfig};
use docqa_rag::RagConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// Settings for calls to the generation model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Upper bound on the characters of retrieved context placed in a prompt.
    pub max_context_chars: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base: OPENAI_API_BASE.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: None,
            max_context_chars: 12_000,
        }
    }
}

/// Settings for topic suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicConfig {
    /// How many chunks are sampled into the suggestion prompt.
    pub sample_size: usize,
    /// Fewest questions the model is asked for.
    pub min_suggestions: usize,
    /// Most questions kept from the model's reply.
    pub max_suggestions: usize,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self { sample_size: 5, min_suggestions: 4, max_suggestions: 6 }
    }
}

/// Top-level docqa configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocQaConfig {
    pub rag: RagConfig,
    pub retry: RetryConfig,
    pub generation: GenerationConfig,
    pub topics: TopicConfig,
}

impl DocQaConfig {
    /// Check that every section is internally consistent.
    pub fn validate(&self) -> Result<()> {
        self.rag.validate()?;
        if self.retry.max_attempts == 0 {
            return Err(SessionError::Config("retry.max_attempts must be at least 1".into()));
        }
        if self.generation.max_context_chars == 0 {
            return Err(SessionError::Config(
                "generation.max_context_chars must be greater than zero".into(),
            ));
        }
        if self.generation.chat_model.trim().is_empty() {
            return Err(SessionError::Config("generation.chat_model must not be empty".into()));
        }
        if self.topics.sample_size == 0 {
            return Err(SessionError::Config("topics.sample_size must be greater than zero".into()));
        }
        let topics = &self.topics;
        if topics.min_suggestions == 0 || topics.min_suggestions > topics.max_suggestions {
            return Err(SessionError::Config(format!(
                "topics.min_suggestions ({}) must be between 1 and max_suggestions ({})",
                self.topics.min_suggestions, self.topics.max_suggestions
            )));
        }
        Ok(())
    }
}

/// Load configuration.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `DOCQA_`, nested keys split on `__`)
/// 2. The TOML file at `path`, if given
/// 3. Built-in defaults
pub fn load_config(path: Option<&Path>) -> Result<DocQaConfig> {
    let mut figment = Figment::from(Serialized::defaults(DocQaConfig::default()));

    if let Some(path) = path {
        if !path.exists() {
            return Err(SessionError::Config(format!("config file {} not found", path.display())));
        }
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("DOCQA_").split("__"));

    let config: DocQaConfig =
        figment.extract().map_err(|e| SessionError::Config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = DocQaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.generation.chat_model, "gpt-4o-mini");
        assert_eq!(config.generation.api_base, OPENAI_API_BASE);
        assert_eq!(config.generation.embedding_model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(config.rag.chunk_size, 1000);
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[rag]\ntop_k = 5\nsimilarity_threshold = 0.25\n\n\
             [generation]\nchat_model = \"gpt-4o\"\n"
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.rag.top_k, 5);
        assert_eq!(config.rag.chunk_size, 1000);
        assert!((config.rag.similarity_threshold - 0.25).abs() < f32::EPSILON);
        assert_eq!(config.generation.chat_model, "gpt-4o");
    }

    #[test]
    fn invalid_file_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[rag]\nchunk_size = 100\nchunk_overlap = 150\n").unwrap();
        assert!(matches!(load_config(Some(file.path())), Err(SessionError::Config(_))));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/docqa.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn min_suggestions_above_max_is_rejected() {
        let mut config = DocQaConfig::default();
        config.topics.min_suggestions = 7;
        assert!(config.validate().is_err());
    }
}
