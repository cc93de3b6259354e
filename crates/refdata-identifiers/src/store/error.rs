//! Storage error types.

use thiserror::Error;

/// Storage operation result type.
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage error types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from the underlying storage engine.
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Record not found.
    #[error("Record not found: {entity_type} with key '{key}'")]
    NotFound {
        /// The kind of record ("history", "snapshot", "change_request").
        entity_type: &'static str,
        /// The key that was not found.
        key: String,
    },

    /// Duplicate key error.
    #[error("Duplicate key: {entity_type} with key '{key}' already exists")]
    DuplicateKey {
        /// The kind of record.
        entity_type: &'static str,
        /// The duplicate key.
        key: String,
    },

    /// An optimistic guard did not hold.
    #[error("Version conflict on '{key}': expected {expected}, found {actual}")]
    VersionConflict {
        /// The guarded key.
        key: String,
        /// What the writer read.
        expected: String,
        /// What the store holds.
        actual: String,
    },

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl StoreError {
    /// Creates a version conflict error.
    #[must_use]
    pub fn conflict(key: impl Into<String>, expected: impl ToString, actual: impl ToString) -> Self {
        Self::VersionConflict {
            key: key.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

impl From<redb::Error> for StoreError {
    fn from(err: redb::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<redb::DatabaseError> for StoreError {
    fn from(err: redb::DatabaseError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(err: redb::TableError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(err: redb::TransactionError) -> Self {
        StoreError::Transaction(err.to_string())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(err: redb::CommitError) -> Self {
        StoreError::Transaction(err.to_string())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(err: redb::StorageError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            StoreError::Deserialization(err.to_string())
        } else {
            StoreError::Serialization(err.to_string())
        }
    }
}
