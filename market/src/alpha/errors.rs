use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlphaError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from alpha api: {0}")]
    InvalidResponse(String),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("request timed out")]
    Timeout,
}
