//! # docqa-core
//!
//! Building blocks shared by every docqa crate:
//!
//! - [`Credentials`] - caller-supplied API key, redacted in `Debug` output
//! - [`ServiceError`] / [`FailureKind`] - classification of external-service
//!   failures into auth, transient, and rejected
//! - [`RetryConfig`] / [`with_retry`] - bounded exponential backoff for
//!   transient failures
//! - [`openai`] - default API base URL and model names
//!
//! ## Features
//!
//! | feature | enables |
//! |---------|---------|
//! | `http` | [`ServiceError::from_transport`] for `reqwest` failures |

mod credentials;
mod error;
pub mod openai;
mod retry;

pub use credentials::Credentials;
pub use error::{FailureKind, ServiceError};
pub use openai::{DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL, OPENAI_API_BASE};
pub use retry::{RetryConfig, with_retry};
