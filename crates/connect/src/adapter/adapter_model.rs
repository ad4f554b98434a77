//! Shared adapter types: errors, balances, credential checks.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure categories for exchange API calls.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// Bad or expired API credentials. Retrying cannot help.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The exchange throttled us.
    #[error("Rate limited by exchange: {0}")]
    RateLimited(String),

    #[error("Network error: {0}")]
    Network(String),

    /// The exchange answered with a server-side failure.
    #[error("Exchange unavailable: {0}")]
    ExchangeUnavailable(String),

    /// The exchange answered 2xx but the body did not parse.
    #[error("Invalid exchange response: {0}")]
    InvalidResponse(String),
}

impl AdapterError {
    /// Whether a later attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            AdapterError::Authentication(_) | AdapterError::InvalidResponse(_)
        )
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        AdapterError::Network(err.to_string())
    }
}

/// One non-dust asset balance held on an exchange, valued in USD.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeBalance {
    /// Exchange asset code, e.g. "BTC".
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
    pub total: Decimal,
    pub usd_value: Decimal,
}

/// Outcome of a credential round trip against the exchange.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialValidation {
    pub valid: bool,
    pub error: Option<String>,
}

impl CredentialValidation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(message.into()),
        }
    }
}
