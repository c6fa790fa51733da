//! # docqa-model
//!
//! Answer-generation models for docqa.
//!
//! - [`Llm`] - the generation interface, credentials supplied per call
//! - [`OpenAIClient`] - OpenAI chat completions (and compatible servers)
//! - [`MockLlm`] - scripted model for tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docqa_core::Credentials;
//! use docqa_model::{GenerationRequest, Llm, OpenAIClient};
//!
//! let model = OpenAIClient::new("gpt-4o-mini");
//! let credentials = Credentials::from_env("OPENAI_API_KEY").ok_or("OPENAI_API_KEY not set")?;
//! let text = model.generate(GenerationRequest::from_prompt("Hello"), &credentials).await?;
//! ```

pub mod llm;
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;

pub use llm::{GenerationRequest, Llm, Message, Result, Role};
pub use mock::MockLlm;
#[cfg(feature = "openai")]
pub use openai::OpenAIClient;
