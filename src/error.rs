//! Error types for the practice engine.
//!
//! Every failure in this crate is local and recoverable: a rejected import or
//! config value leaves the engine exactly as it was.

/// A specialized `Result` type for practice engine operations.
pub type Result<T> = std::result::Result<T, PracticeError>;

#[derive(Debug, thiserror::Error)]
pub enum PracticeError {
    /// An imported snapshot did not have the expected shape.
    #[error("Malformed import: {reason}")]
    MalformedImport { reason: String },

    /// A config value was rejected; the previous value is retained.
    #[error("Invalid value '{value}' for '{key}': {reason}")]
    InvalidConfig {
        key: String,
        value: String,
        reason: String,
    },

    /// No built-in word list has this name.
    #[error("Unknown language '{name}'")]
    UnknownLanguage { name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl PracticeError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedImport {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}
