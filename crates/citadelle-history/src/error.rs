//! History error types.

use thiserror::Error;

/// Result type for history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Errors that can occur during history operations.
///
/// Unknown document or version ids are not errors: queries come back empty
/// and deletes are no-ops.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Durable storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] citadelle_storage::StorageError),

    /// Version labels must contain something other than whitespace.
    #[error("Invalid version label: {0:?}")]
    InvalidLabel(String),

    /// Capacity reached, nothing evictable, and the overflow policy rejects.
    #[error("History for document {document_id} is full ({capacity} versions, none evictable)")]
    CapacityExhausted {
        document_id: String,
        capacity: usize,
    },

    /// The persisted collection carries a format tag this build cannot read.
    #[error("Unsupported history format {found} (expected {expected})")]
    UnsupportedFormat { found: u32, expected: u32 },

    /// The persisted collection is readable but inconsistent.
    #[error("Corrupted history: {0}")]
    Corrupted(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A diff offloaded to a blocking task did not complete.
    #[error("Background diff failed: {0}")]
    Background(#[from] tokio::task::JoinError),
}

impl HistoryError {
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid JSON/JSONC syntax or shape.
    #[error("invalid config at {path}: {message}")]
    InvalidJson { path: String, message: String },

    /// A setting holds a value outside its domain.
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },

    /// Reading a config file failed.
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub fn invalid_value(name: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidValue {
            name: name.into(),
            value: value.to_string(),
        }
    }
}
