//! Error types for ActiveModel operations.
//!
//! Validation failures and storage failures are kept apart: a record that
//! breaks one of its declared rules yields [`ActiveModelError::Validation`],
//! while a write the store itself refuses surfaces unchanged as
//! [`ActiveModelError::Storage`].

use crate::executor::{ConstraintViolation, ShelfError};
use crate::store::RowError;
use crate::validation::ValidationErrors;
use thiserror::Error;

/// Error type for ActiveModel operations
#[derive(Debug, Error)]
pub enum ActiveModelError {
    /// The record broke one or more of its validation rules
    #[error("{0}")]
    Validation(ValidationErrors),
    /// No row with this id
    #[error("Couldn't find {table} with id={id}")]
    RecordNotFound { table: &'static str, id: i64 },
    /// The operation needs a saved record
    #[error("{0} record has not been saved yet")]
    NotPersisted(&'static str),
    /// The store rejected the operation
    #[error("Storage error: {0}")]
    Storage(#[from] ShelfError),
    /// Attributes could not be turned into the record type
    #[error("Invalid attributes: {0}")]
    InvalidAttributes(String),
    /// A stored row could not be decoded into the record type
    #[error("Invalid stored row: {0}")]
    Column(#[from] RowError),
}

impl ActiveModelError {
    /// The storage constraint behind this error, if any
    #[must_use]
    pub fn constraint(&self) -> Option<&ConstraintViolation> {
        match self {
            ActiveModelError::Storage(e) => e.constraint(),
            _ => None,
        }
    }

    /// The validation failures behind this error, if any
    #[must_use]
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ActiveModelError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ActiveModelError {
    fn from(e: serde_json::Error) -> Self {
        ActiveModelError::InvalidAttributes(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::FailureKind;

    #[test]
    fn test_validation_and_storage_are_distinct() {
        let mut errors = ValidationErrors::new();
        errors.add("name", FailureKind::Taken);
        let validation = ActiveModelError::Validation(errors);
        assert!(validation.constraint().is_none());
        assert_eq!(validation.to_string(), "Validation failed: Name has already been taken");

        let storage = ActiveModelError::from(ShelfError::from(ConstraintViolation::Unique {
            table: "books".to_string(),
            index: "index_books_on_name".to_string(),
            columns: vec!["name".to_string()],
        }));
        assert!(storage.validation_errors().is_none());
        assert!(matches!(storage.constraint(), Some(ConstraintViolation::Unique { .. })));
    }
}
