//! Migration-specific error types

use crate::executor::ShelfError;
use crate::store::RowError;
use thiserror::Error;

/// Migration-specific errors
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Store error outside of a migration unit (state table access, schema reads)
    #[error("Storage error: {0}")]
    Storage(#[from] ShelfError),

    /// A state table row could not be decoded
    #[error("Malformed migration record: {0}")]
    Record(#[from] RowError),

    /// Operation list could not be serialized for checksumming or dumping
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid migration identifier or file name
    #[error("Invalid migration format: {0}")]
    InvalidFormat(String),

    /// Version is not a `YYYYMMDDHHMMSS` timestamp
    #[error("Invalid migration version: {0}")]
    InvalidVersion(String),

    /// Two migrations share a version
    #[error("Migration version {version} is already registered (by '{name}')")]
    AlreadyRegistered { version: i64, name: String },

    /// Applied migration whose definition changed afterwards
    #[error(
        "Migration '{name}' (version {version}) has been modified after being applied.\n\
         Stored checksum: {stored}\n\
         Current checksum: {current}\n\
         This indicates the migration was edited after deployment."
    )]
    ChecksumMismatch {
        version: i64,
        name: String,
        stored: String,
        current: String,
    },

    /// Recorded as applied, but no such migration is registered
    #[error(
        "Applied migration not found: m{version}_{name}\n\
         Suggestion: Ensure every applied migration is still registered"
    )]
    MissingMigration { version: i64, name: String },

    /// Rollback reached an operation that cannot be undone
    #[error("Migration '{name}' (version {version}) is irreversible: cannot undo {operation}")]
    Irreversible {
        version: i64,
        name: String,
        operation: String,
    },

    /// A migration unit failed and was rolled back
    #[error("Migration '{name}' (version {version}) failed during execution: {source}")]
    ExecutionFailed {
        version: i64,
        name: String,
        #[source]
        source: ShelfError,
    },
}

impl MigrationError {
    /// Whether this is a rollback refused because of an irreversible operation
    #[must_use]
    pub fn is_irreversible(&self) -> bool {
        matches!(self, MigrationError::Irreversible { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_mismatch_message() {
        let err = MigrationError::ChecksumMismatch {
            version: 20230403081343,
            name: "create_books".to_string(),
            stored: "abc".to_string(),
            current: "def".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("'create_books' (version 20230403081343)"));
        assert!(message.contains("Stored checksum: abc"));
    }

    #[test]
    fn test_execution_failure_keeps_source() {
        let err = MigrationError::ExecutionFailed {
            version: 1,
            name: "broken".to_string(),
            source: ShelfError::UnknownTable("ghosts".to_string()),
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_irreversible());
    }
}
