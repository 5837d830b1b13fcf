//! Error types for the domain layer.

use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be a finite non-negative amount, got {actual}")]
    InvalidAmount { field: String, actual: f64 },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("Bid of {actual} is below the minimum of {minimum}")]
    BidTooLow { minimum: f64, actual: f64 },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid amount validation error.
    pub fn invalid_amount(field: impl Into<String>, actual: f64) -> Self {
        ValidationError::InvalidAmount {
            field: field.into(),
            actual,
        }
    }

    /// Creates a bid-below-minimum validation error.
    pub fn bid_too_low(minimum: f64, actual: f64) -> Self {
        ValidationError::BidTooLow { minimum, actual }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
