use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("authentication failed: {0}")]
    AuthFailure(String),

    #[error("authorization retry exhausted: request rejected with 401 twice")]
    AuthRetryExhausted,

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("registration rejected: {observation}")]
    BusinessRejection { observation: String },
}

pub type Result<T> = std::result::Result<T, MigrateError>;
