//! Gateway error types

use crate::ports::durable_store::StoreError;
use council_domain::ReasonCode;
use thiserror::Error;

/// Errors returned by the persistence gateway
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistenceError {
    /// The stored version advanced since the caller last read it
    #[error("Conflict on {key}: expected version {expected}, stored version is {actual}")]
    Conflict { key: String, expected: u64, actual: u64 },

    /// An append-only record with this key already exists
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl PersistenceError {
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            PersistenceError::Conflict { .. } => ReasonCode::PersistenceConflict,
            _ => ReasonCode::PersistenceFailure,
        }
    }

    /// Whether the same call may succeed after a backoff
    pub fn is_transient(&self) -> bool {
        matches!(self, PersistenceError::Store(e) if e.is_transient())
    }
}

impl From<StoreError> for PersistenceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::VersionMismatch {
                key,
                expected,
                actual,
            } => PersistenceError::Conflict {
                key,
                expected,
                actual,
            },
            StoreError::AlreadyExists(key) => PersistenceError::Duplicate(key),
            other => PersistenceError::Store(other),
        }
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(error: serde_json::Error) -> Self {
        PersistenceError::Store(StoreError::Serialization(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_gateway_errors() {
        let conflict: PersistenceError = StoreError::VersionMismatch {
            key: "ses-1".to_string(),
            expected: 1,
            actual: 2,
        }
        .into();
        assert_eq!(conflict.reason_code(), ReasonCode::PersistenceConflict);

        let duplicate: PersistenceError = StoreError::AlreadyExists("ses-1".to_string()).into();
        assert_eq!(duplicate, PersistenceError::Duplicate("ses-1".to_string()));
        assert_eq!(duplicate.reason_code(), ReasonCode::PersistenceFailure);

        let unavailable: PersistenceError = StoreError::Unavailable("disk".to_string()).into();
        assert!(unavailable.is_transient());
        assert!(!duplicate.is_transient());
    }
}
