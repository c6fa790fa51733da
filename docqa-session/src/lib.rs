//! # docqa-session
//!
//! Question answering over one uploaded document per session.
//!
//! - [`Session`] - the document lifecycle: upload, lazy indexing, ask, topics, clear
//! - [`SessionManager`] - sessions keyed by an opaque id
//! - [`QaPipeline`] - the shared extractor, chunker, retriever, synthesizer and suggester
//! - [`AnswerSynthesizer`] - grounded prompts and the "I am not sure." sentinel
//! - [`TopicSuggester`] - suggested questions from sampled chunks
//! - [`load_config`] - layered configuration (defaults, TOML file, `DOCQA_*` env)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docqa_core::Credentials;
//! use docqa_session::{PDF_CONTENT_TYPE, QaPipeline, SessionManager, load_config};
//!
//! let config = load_config(None)?;
//! let manager = SessionManager::new(Arc::new(QaPipeline::openai(config)?));
//! let session = manager.create_session().await;
//!
//! session.upload("report.pdf", &bytes, Some(PDF_CONTENT_TYPE)).await?;
//! let credentials = Credentials::from_env("OPENAI_API_KEY").ok_or("OPENAI_API_KEY not set")?;
//! let answer = session.ask("What is the conclusion?", &credentials).await?;
//! println!("{} ({} sources)", answer.answer, answer.sources_used);
//! ```

pub mod config;
pub mod error;
pub mod manager;
pub mod pipeline;
pub mod session;
pub mod synthesizer;
pub mod topics;

pub use config::{DocQaConfig, GenerationConfig, TopicConfig, load_config};
pub use docqa_rag::PDF_CONTENT_TYPE;
pub use error::{Result, SessionError};
pub use manager::SessionManager;
pub use pipeline::{QaPipeline, QaPipelineBuilder};
pub use session::{
    Session, SessionId, SessionPhase, SessionStatus, TopicSuggestions, UploadReceipt,
};
pub use synthesizer::{Answer, AnswerSynthesizer, NOT_SURE_ANSWER};
pub use topics::{TopicSuggester, parse_suggestions};
