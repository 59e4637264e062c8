use thiserror::Error;

#[derive(Error, Debug)]
pub enum TailError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unrecognized timestamp: {0}")]
    Timestamp(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
