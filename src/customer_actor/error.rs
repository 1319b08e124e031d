//! Error types for the customer registry.

use crate::model::CustomerId;
use thiserror::Error;

/// Errors that can occur during customer operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CustomerError {
    /// The requested customer was not found.
    #[error("Customer not found: {0}")]
    NotFound(CustomerId),

    /// The customer data provided is invalid.
    #[error("Customer validation error: {0}")]
    Validation(String),

    /// The registry could not be reached.
    #[error("Customer store error: {0}")]
    Store(String),
}
