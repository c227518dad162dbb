//! Custom error types for invoice-cli
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for invoice-cli operations
#[derive(Error, Debug)]
pub enum InvoiceError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// The sequence state file exists but does not hold a year -> counter map
    #[error("Corrupt state file {}: {reason}", path.display())]
    CorruptState { path: PathBuf, reason: String },

    /// An invoice number that is not `YEAR/SEQ`
    #[error("Malformed invoice number: {0:?} (expected YEAR/SEQ)")]
    MalformedNumber(String),

    /// No exchange rate could be obtained
    #[error("No {currency} rate available for {date}: {reason}")]
    RateUnavailable {
        currency: String,
        date: NaiveDate,
        reason: String,
    },

    /// Invoice is finalised and cannot be edited
    #[error("Invoice {0} is finalised; unfinalise it before editing")]
    Finalised(String),
}

impl InvoiceError {
    /// Create a "not found" error for products
    pub fn product_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Product",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for customers
    pub fn customer_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Customer",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for invoices
    pub fn invoice_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Invoice",
            identifier: identifier.into(),
        }
    }

    pub fn rate_unavailable(
        currency: impl Into<String>,
        date: NaiveDate,
        reason: impl Into<String>,
    ) -> Self {
        Self::RateUnavailable {
            currency: currency.into(),
            date,
            reason: reason.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for InvoiceError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for InvoiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for invoice-cli operations
pub type InvoiceResult<T> = Result<T, InvoiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = InvoiceError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = InvoiceError::product_not_found("WEB");
        assert_eq!(err.to_string(), "Product not found: WEB");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_malformed_number_error() {
        let err = InvoiceError::MalformedNumber("2024-05".into());
        assert_eq!(
            err.to_string(),
            "Malformed invoice number: \"2024-05\" (expected YEAR/SEQ)"
        );
    }

    #[test]
    fn test_rate_unavailable_error() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let err = InvoiceError::rate_unavailable("EUR", date, "no table published");
        assert_eq!(
            err.to_string(),
            "No EUR rate available for 2024-01-02: no table published"
        );
    }

    #[test]
    fn test_corrupt_state_error() {
        let err = InvoiceError::CorruptState {
            path: PathBuf::from("/tmp/state"),
            reason: "expected value".into(),
        };
        assert_eq!(
            err.to_string(),
            "Corrupt state file /tmp/state: expected value"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let invoice_err: InvoiceError = io_err.into();
        assert!(matches!(invoice_err, InvoiceError::Io(_)));
    }
}
