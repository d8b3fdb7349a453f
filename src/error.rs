use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlackAppenderError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("No style mapping for severity level: {0}")]
    MissingMapping(String),

    #[error("Invalid webhook url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Dispatcher runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SlackAppenderError>;
