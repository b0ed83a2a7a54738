//! Error types for competitive-research

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResearchError {
    #[error("Failed to fetch URL: {url}")]
    FetchError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for URL: {url}")]
    HttpStatusError { url: String, status: u16 },

    #[error("Failed to fetch URL after {attempts} attempts: {url} (last error: {last_error})")]
    RetryExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Search backend {backend} error: {message}")]
    SearchError {
        backend: &'static str,
        message: String,
    },

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("OpenAI API error: {0}")]
    OpenAiError(#[from] async_openai::error::OpenAIError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, ResearchError>;
