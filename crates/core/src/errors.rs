//! Core error types for the portfolio application.
//!
//! This module defines storage-agnostic error types. Storage-specific errors
//! are converted to these types by the storage layer. The variants mirror
//! the propagation policy: validation, not-found, and conflict conditions
//! reach callers as explicit results; everything recoverable is handled
//! inside the owning component.

use thiserror::Error;

use lotfolio_market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the portfolio core.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed caller input; rejected synchronously.
    #[error("Input validation failed: {0}")]
    Validation(String),

    /// The requested portfolio, asset, or connection does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate sync request or conflicting concurrent write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backing store failed; details are storage-specific strings to
    /// keep this type database-agnostic.
    #[error("Repository error: {0}")]
    Repository(String),

    /// Market data operation failed past the gateway boundary (validation
    /// errors only - provider failures degrade inside the gateway).
    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    /// An exchange adapter failed in a way the sync layer did not absorb.
    #[error("Exchange adapter error: {0}")]
    Adapter(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(err.to_string())
    }
}

impl From<chrono::ParseError> for Error {
    fn from(err: chrono::ParseError) -> Self {
        Error::Validation(err.to_string())
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
