use reqwest::StatusCode;

/// Errors surfaced by the provider registry and the LLM gateway.
///
/// Transport and status failures are retryable by the caller; configuration
/// and parse failures are not. Nothing here is retried internally.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("unknown LLM provider '{0}'")]
    UnknownProvider(String),
    #[error("transport error talking to LLM provider: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("LLM provider returned HTTP {0}")]
    Status(StatusCode),
    #[error("failed to parse LLM provider response: {0}")]
    Parse(#[from] serde_json::Error),
}
