//! The question-answering pipeline shared by every session.
//!
//! A [`QaPipeline`] bundles the stateless components: extractor, chunker,
//! retriever (with its embedding provider), synthesizer and topic suggester.
//! Sessions hold an `Arc<QaPipeline>` and keep only their own document state.
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_session::{DocQaConfig, QaPipeline};
//!
//! let pipeline = QaPipeline::builder()
//!     .config(DocQaConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .llm(Arc::new(my_llm))
//!     .build()?;
//! ```

use std::sync::Arc;

use docqa_model::Llm;
use docqa_rag::{
    Chunker, EmbeddingProvider, FixedSizeChunker, PdfTextExtractor, Retriever, TextExtractor,
};

use crate::config::DocQaConfig;
use crate::error::{Result, SessionError};
use crate::synthesizer::AnswerSynthesizer;
use crate::topics::TopicSuggester;

/// Stateless components used by [`Session`](crate::Session) operations.
pub struct QaPipeline {
    config: DocQaConfig,
    extractor: Arc<dyn TextExtractor>,
    chunker: Arc<dyn Chunker>,
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
    suggester: TopicSuggester,
}

impl QaPipeline {
    /// Create a new [`QaPipelineBuilder`].
    pub fn builder() -> QaPipelineBuilder {
        QaPipelineBuilder::default()
    }

    /// A pipeline backed by the OpenAI embeddings and chat-completions APIs.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] if `config` is invalid.
    #[cfg(feature = "openai")]
    pub fn openai(config: DocQaConfig) -> Result<Self> {
        let generation = &config.generation;
        let embedder = docqa_rag::OpenAIEmbeddingProvider::new()
            .with_model(generation.embedding_model.clone())
            .with_base_url(generation.api_base.clone())
            .with_retry(config.retry.clone());
        let llm = docqa_model::OpenAIClient::new(generation.chat_model.clone())
            .with_base_url(generation.api_base.clone())
            .with_retry(config.retry.clone());

        Self::builder()
            .config(config)
            .embedding_provider(Arc::new(embedder))
            .llm(Arc::new(llm))
            .build()
    }

    pub fn config(&self) -> &DocQaConfig {
        &self.config
    }

    pub fn extractor(&self) -> &Arc<dyn TextExtractor> {
        &self.extractor
    }

    pub fn chunker(&self) -> &Arc<dyn Chunker> {
        &self.chunker
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// The embedding provider used for both index builds and queries.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        self.retriever.provider()
    }

    pub fn synthesizer(&self) -> &AnswerSynthesizer {
        &self.synthesizer
    }

    pub fn suggester(&self) -> &TopicSuggester {
        &self.suggester
    }
}

/// Builder for constructing a [`QaPipeline`].
///
/// `embedding_provider` and `llm` are required. The extractor defaults to
/// [`PdfTextExtractor`] and the chunker to [`FixedSizeChunker`], both sized
/// from the config.
#[derive(Default)]
pub struct QaPipelineBuilder {
    config: Option<DocQaConfig>,
    extractor: Option<Arc<dyn TextExtractor>>,
    chunker: Option<Arc<dyn Chunker>>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    llm: Option<Arc<dyn Llm>>,
}

impl QaPipelineBuilder {
    pub fn config(mut self, config: DocQaConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the model used for both answers and topic suggestions.
    pub fn llm(mut self, llm: Arc<dyn Llm>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Build the [`QaPipeline`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] if a required field is missing or
    /// the config fails validation.
    pub fn build(self) -> Result<QaPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| SessionError::Config("embedding_provider is required".to_string()))?;
        let llm = self.llm.ok_or_else(|| SessionError::Config("llm is required".to_string()))?;

        let extractor = self.extractor.unwrap_or_else(|| {
            Arc::new(PdfTextExtractor::new().with_max_bytes(config.rag.max_document_bytes))
        });
        let chunker =
            self.chunker.unwrap_or_else(|| Arc::new(FixedSizeChunker::from_config(&config.rag)));

        Ok(QaPipeline {
            retriever: Retriever::from_config(embedding_provider, &config.rag),
            synthesizer: AnswerSynthesizer::from_config(llm.clone(), &config.generation),
            suggester: TopicSuggester::from_config(llm, &config.topics),
            extractor,
            chunker,
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_model::MockLlm;
    use docqa_rag::KeywordEmbeddingProvider;

    #[test]
    fn builder_requires_components() {
        let err = QaPipeline::builder().llm(Arc::new(MockLlm::new("x"))).build().err().unwrap();
        assert!(err.to_string().contains("embedding_provider"));

        let err = QaPipeline::builder()
            .embedding_provider(Arc::new(KeywordEmbeddingProvider::default()))
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("llm"));
    }

    #[test]
    fn builder_applies_config() {
        let mut config = DocQaConfig::default();
        config.rag.top_k = 5;
        config.generation.max_context_chars = 4000;

        let pipeline = QaPipeline::builder()
            .config(config)
            .embedding_provider(Arc::new(KeywordEmbeddingProvider::default()))
            .llm(Arc::new(MockLlm::new("x")))
            .build()
            .unwrap();

        assert_eq!(pipeline.retriever().top_k(), 5);
        assert_eq!(pipeline.synthesizer().max_context_chars(), 4000);
        assert_eq!(pipeline.embedding_provider().name(), "keyword");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = DocQaConfig::default();
        config.rag.chunk_overlap = config.rag.chunk_size;
        let result = QaPipeline::builder()
            .config(config)
            .embedding_provider(Arc::new(KeywordEmbeddingProvider::default()))
            .llm(Arc::new(MockLlm::new("x")))
            .build();
        assert!(matches!(result, Err(SessionError::Config(_))));
    }
}
