//! Store error types.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The key does not exist in the backend (or has already expired there).
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// The key exists but its value carries no TTL envelope.
    #[error("Cannot retrieve ttl: {0} has no associated timeout")]
    NoTtlAssociated(String),

    #[error("Store operation failed: {0}")]
    Operation(String),

    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Returns `true` for [`StoreError::KeyNotFound`].
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, StoreError::KeyNotFound(_))
    }

    pub(crate) fn key_not_found(key: &str) -> Self {
        StoreError::KeyNotFound(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            StoreError::key_not_found("a").to_string(),
            "Key not found: a"
        );
        assert_eq!(
            StoreError::NoTtlAssociated("a".into()).to_string(),
            "Cannot retrieve ttl: a has no associated timeout"
        );
    }

    #[test]
    fn test_is_key_not_found() {
        assert!(StoreError::key_not_found("a").is_key_not_found());
        assert!(!StoreError::Operation("boom".into()).is_key_not_found());
    }
}
