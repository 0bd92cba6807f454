use thiserror::Error;

#[derive(Error, Debug)]
pub enum NewsError {
    #[error("database error: {0}")]
    Database(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("authentication required: {0}")]
    Unauthorized(String),

    #[error("permission denied: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for NewsError {
    fn from(e: rusqlite::Error) -> Self {
        NewsError::Database(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NewsError>;
