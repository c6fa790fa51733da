//! Defaults shared by the OpenAI-compatible clients and the configuration.

/// The public OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Chat model used for answers and topic suggestions.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Embedding model used for chunks and questions.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
