use thiserror::Error;

#[derive(Debug, Error)]
pub enum PilotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM provider error: {0}")]
    LlmProvider(String),

    #[error("Perception error: {0}")]
    Perception(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Calibration error: {0}")]
    Calibration(String),

    #[error("Narration error: {0}")]
    Narration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Task cancelled")]
    Cancelled,
}

pub type PilotResult<T> = Result<T, PilotError>;
