//! Failure taxonomy for calls to external embedding and generation services.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How an external-service failure should be treated by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Invalid or missing credentials. Fatal for the current request.
    Auth,
    /// Rate limiting, timeouts, connection and server errors. Retried with backoff.
    Transient,
    /// The service refused the request or returned something unusable.
    /// Deterministic for the same input, so never retried.
    Rejected,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Auth => "auth",
            FailureKind::Transient => "transient",
            FailureKind::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// A classified failure from an external service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{service} {kind} error: {message}")]
pub struct ServiceError {
    /// The service that produced the error (e.g. `OpenAI embeddings`).
    pub service: String,
    /// How the failure is handled.
    pub kind: FailureKind,
    /// A description of the failure.
    pub message: String,
}

impl ServiceError {
    pub fn new(service: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self { service: service.into(), kind, message: message.into() }
    }

    pub fn auth(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(service, FailureKind::Auth, message)
    }

    pub fn transient(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(service, FailureKind::Transient, message)
    }

    pub fn rejected(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(service, FailureKind::Rejected, message)
    }

    /// Classify a non-success HTTP status.
    ///
    /// 401/403 are auth failures; 408, 409, 429 and 5xx are transient;
    /// every other status is a rejection.
    pub fn from_status(service: impl Into<String>, status: u16, detail: impl Into<String>) -> Self {
        let kind = match status {
            401 | 403 => FailureKind::Auth,
            408 | 409 | 429 => FailureKind::Transient,
            s if s >= 500 => FailureKind::Transient,
            _ => FailureKind::Rejected,
        };
        Self::new(service, kind, format!("API returned {status}: {}", detail.into()))
    }

    /// Classify a `reqwest` failure that produced no HTTP response.
    ///
    /// Timeouts, connection and request-send errors are transient; anything
    /// else (body decoding, redirects, builder errors) is a rejection.
    #[cfg(feature = "http")]
    pub fn from_transport(service: impl Into<String>, error: &reqwest::Error) -> Self {
        let kind = if error.is_timeout() || error.is_connect() || error.is_request() {
            FailureKind::Transient
        } else {
            FailureKind::Rejected
        };
        Self::new(service, kind, format!("request failed: {error}"))
    }

    pub fn is_retryable(&self) -> bool {
        self.kind == FailureKind::Transient
    }

    pub fn is_auth(&self) -> bool {
        self.kind == FailureKind::Auth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_http_statuses() {
        assert_eq!(ServiceError::from_status("svc", 401, "").kind, FailureKind::Auth);
        assert_eq!(ServiceError::from_status("svc", 403, "").kind, FailureKind::Auth);
        assert_eq!(ServiceError::from_status("svc", 429, "").kind, FailureKind::Transient);
        assert_eq!(ServiceError::from_status("svc", 500, "").kind, FailureKind::Transient);
        assert_eq!(ServiceError::from_status("svc", 503, "").kind, FailureKind::Transient);
        assert_eq!(ServiceError::from_status("svc", 400, "").kind, FailureKind::Rejected);
        assert_eq!(ServiceError::from_status("svc", 404, "").kind, FailureKind::Rejected);
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn refused_connection_is_transient() {
        let error = reqwest::Client::new().get("http://127.0.0.1:9/").send().await.unwrap_err();
        let err = ServiceError::from_transport("svc", &error);
        assert_eq!(err.kind, FailureKind::Transient);
        assert!(err.message.starts_with("request failed"));
    }

    #[test]
    fn display_includes_service_and_kind() {
        let err = ServiceError::from_status("OpenAI embeddings", 401, "Incorrect API key");
        let text = err.to_string();
        assert!(text.starts_with("OpenAI embeddings auth error"));
        assert!(text.contains("Incorrect API key"));
    }
}
