//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error (permission denied, disk full, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid key format
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Lock was poisoned (another thread panicked while holding the lock)
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl StorageError {
    /// Create an invalid key error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_key_formats_message() {
        let err = StorageError::invalid_key("empty key component");
        assert_eq!(err.to_string(), "Invalid key: empty key component");
    }

    #[test]
    fn json_error_wraps_serde_error() {
        let json_err = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        let err = StorageError::from(json_err);
        assert!(err.to_string().starts_with("JSON error"));
    }

    #[test]
    fn key_validation() {
        assert!(crate::validate_key(&["citadelle-versions"]).is_ok());
        assert!(crate::validate_key(&[]).is_err());
        assert!(crate::validate_key(&["..", "etc"]).is_err());
        assert!(crate::validate_key(&["a/b"]).is_err());
        assert!(crate::validate_key(&[""]).is_err());
    }
}
