//! Unified error types for the domain layer
//!
//! Snapshot lookups and value-object construction report failures through
//! [`DomainError`] so callers never have to fall back to bare strings.

use thiserror::Error;

use crate::value_objects::DiceParseError;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Invalid ID format
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// Entity not present in the snapshot
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Parse error (for value objects)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Value outside the allowed range
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },
}

impl DomainError {
    /// Creates a validation error for rule violations.
    ///
    /// # Example
    /// ```ignore
    /// if name.is_empty() {
    ///     return Err(DomainError::validation("Character name cannot be empty"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Create an invalid ID error
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Creates a parse error for string-to-type conversion failures.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an out-of-range error
    pub fn out_of_range(field: &'static str, min: i64, max: i64, value: i64) -> Self {
        Self::OutOfRange {
            field,
            min,
            max,
            value,
        }
    }
}

impl From<DiceParseError> for DomainError {
    fn from(err: DiceParseError) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = DomainError::validation("name cannot be empty");
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(err.to_string(), "Validation failed: name cannot be empty");
    }

    #[test]
    fn test_not_found_error() {
        let err = DomainError::not_found("Character", "Zed");
        assert_eq!(err.to_string(), "Entity not found: Character 'Zed'");
    }

    #[test]
    fn test_out_of_range_error() {
        let err = DomainError::out_of_range("level", 1, 9, 12);
        assert_eq!(err.to_string(), "level must be between 1 and 9, got 12");
    }

    #[test]
    fn test_from_dice_parse_error() {
        let domain_err: DomainError = DiceParseError::Empty.into();
        assert!(matches!(domain_err, DomainError::Parse(_)));
        assert!(domain_err.to_string().contains("Empty dice formula"));
    }
}
