//! Models for linked exchange connections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a connection participates in scheduled syncs.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConnectionStatus {
    Active,
    Disabled,
}

/// A link between a portfolio and an exchange account.
///
/// Credentials are never stored on this record; `credential_ref` is an opaque
/// handle resolved through a [`CredentialResolverTrait`] at sync time.
///
/// [`CredentialResolverTrait`]: super::CredentialResolverTrait
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub user_id: String,
    pub portfolio_id: String,
    /// Exchange identifier, e.g. "binance".
    pub exchange_id: String,
    pub status: ConnectionStatus,
    pub credential_ref: String,
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// API credentials resolved for a single sync run. Held in memory only.
#[derive(Debug, Clone)]
pub struct ExchangeCredentials {
    pub api_key: String,
    pub api_secret: String,
}
