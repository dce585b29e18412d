//! Error types for Recast.

use thiserror::Error;

/// Library-level error type for Recast operations.
#[derive(Error, Debug)]
pub enum RecastError {
    #[error("Transcript is empty. Please provide some text to process.")]
    EmptyInput,

    #[error("Stage '{stage}' timed out")]
    StageTimeout { stage: String },

    #[error("Stage '{stage}' failed: {reason}")]
    StageFailed { stage: String, reason: String },

    #[error("Processing was cancelled")]
    Cancelled,

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl RecastError {
    /// Whether the error came from the record store.
    pub fn is_persistence(&self) -> bool {
        matches!(self, RecastError::Persistence(_) | RecastError::Database(_))
    }
}

/// Result type alias for Recast operations.
pub type Result<T> = std::result::Result<T, RecastError>;
