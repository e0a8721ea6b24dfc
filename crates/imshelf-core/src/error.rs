//! Error types for imshelf-core

use thiserror::Error;

/// Result type alias for shelf operations
pub type Result<T> = std::result::Result<T, ShelfError>;

/// Main error type for shelf operations
#[derive(Error, Debug)]
pub enum ShelfError {
    /// A field or row failed validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A checkout/return transition from the wrong state
    #[error("Invalid state: {0}")]
    InvalidState(#[from] InvalidStateError),

    /// The persisted store is present but unusable
    #[error("Corrupt store: {0}")]
    CorruptStore(#[from] CorruptStoreError),

    /// Serialization failure while writing the store
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File I/O failure; treated as fatal at the top level
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Validation failure for a single field or row.
///
/// Messages always name the offending field. Row-scoped failures carry the
/// 1-based row number from the loaded file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A loaded row is not a JSON object
    #[error("Row {0}: each entry must be an object")]
    NotAnObject(usize),

    /// A field in a loaded row failed a check
    #[error("Row {row}: {message}")]
    Row { row: usize, message: String },

    /// A directly entered field failed a check (forms, checkout dates)
    #[error("{0}")]
    Input(String),
}

impl ValidationError {
    /// Row-scoped failure; `row` is 1-based.
    pub fn row(row: usize, message: impl Into<String>) -> Self {
        ValidationError::Row {
            row,
            message: message.into(),
        }
    }

    /// Failure for a directly entered field.
    pub fn input(message: impl Into<String>) -> Self {
        ValidationError::Input(message.into())
    }
}

/// A checkout or return was attempted from the wrong state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidStateError {
    /// Checkout of an item that is already out
    #[error("'{0}' is already checked out")]
    AlreadyCheckedOut(String),

    /// Return of an item that is not out
    #[error("'{0}' is not currently checked out")]
    NotCheckedOut(String),
}

/// The backing file exists but cannot be parsed or validated
#[derive(Error, Debug)]
pub enum CorruptStoreError {
    /// The file is not valid JSON
    #[error("the items file is malformed JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    /// The file parsed but failed normalization
    #[error("the items file contains invalid data: {0}")]
    InvalidData(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_name_row_and_field() {
        let err = ValidationError::row(3, "pages must be a positive integer");
        assert_eq!(err.to_string(), "Row 3: pages must be a positive integer");

        let err = ValidationError::NotAnObject(1);
        assert_eq!(err.to_string(), "Row 1: each entry must be an object");
    }

    #[test]
    fn invalid_state_messages_name_the_item() {
        let err = InvalidStateError::AlreadyCheckedOut("Dune".to_string());
        assert!(err.to_string().contains("Dune"));
        assert!(err.to_string().contains("already checked out"));
    }

    #[test]
    fn corrupt_store_wraps_validation() {
        let err = CorruptStoreError::from(ValidationError::row(2, "id must be a positive integer"));
        assert!(err.to_string().contains("Row 2"));
        assert!(err.to_string().contains("id"));
    }
}
