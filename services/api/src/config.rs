use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Whether frontend messages are forwarded verbatim or run through the AI
/// command pipeline first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BridgeMode {
    Direct,
    Ai,
}

/// Holds all configuration loaded from the environment at startup.
///
/// There are no ambient globals: this value is constructed once in `main`
/// and passed into session construction.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// WebSocket endpoint of the robot actuator.
    pub robot_ws_url: String,
    pub mode: BridgeMode,
    /// Name of the provider table to use for AI-mode turns.
    pub llm_provider: String,
    pub providers_path: PathBuf,
    pub prompt_path: PathBuf,
    pub llm_timeout: Duration,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let robot_ws_url =
            std::env::var("ROBOT_WS_URL").unwrap_or_else(|_| "ws://127.0.0.1:8765".to_string());
        if !robot_ws_url.starts_with("ws://") && !robot_ws_url.starts_with("wss://") {
            return Err(ConfigError::InvalidValue(
                "ROBOT_WS_URL".to_string(),
                format!("'{robot_ws_url}' is not a ws:// or wss:// URL"),
            ));
        }

        let mode_str = std::env::var("BRIDGE_MODE").unwrap_or_else(|_| "direct".to_string());
        let mode = match mode_str.to_lowercase().as_str() {
            "ai" => BridgeMode::Ai,
            _ => BridgeMode::Direct,
        };

        let llm_provider = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "ollama".to_string());

        let providers_path = std::env::var("PROVIDERS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./config/providers.toml"));

        let prompt_path = std::env::var("PROMPT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./config/system_prompt.md"));

        let timeout_str = std::env::var("LLM_TIMEOUT_SECS").unwrap_or_else(|_| "120".to_string());
        let llm_timeout = timeout_str
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "LLM_TIMEOUT_SECS".to_string(),
                    format!("'{timeout_str}' is not a whole number of seconds"),
                )
            })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            robot_ws_url,
            mode,
            llm_provider,
            providers_path,
            prompt_path,
            llm_timeout,
            log_level,
        })
    }
}
