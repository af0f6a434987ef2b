use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("API error: {message}")]
    Api { message: String },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A raw record could not be read as a field mapping.
    #[error("Record {index} could not be decoded: {reason}")]
    InputDecoding { index: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, EventsError>;
