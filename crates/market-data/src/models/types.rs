//! Shared type definitions: asset kinds, provider status, search results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;

/// Classification of asset types the gateway can price.
///
/// The kind drives provider routing: crypto goes to CoinGecko, everything
/// else to Yahoo Finance.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Listed equities and ETFs.
    Equity,
    /// Cryptocurrencies.
    Crypto,
}

impl FromStr for AssetKind {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "EQUITY" | "STOCK" | "ETF" => Ok(AssetKind::Equity),
            "CRYPTO" | "CRYPTOCURRENCY" => Ok(AssetKind::Crypto),
            other => Err(MarketDataError::UnsupportedAssetKind(other.to_string())),
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Equity => write!(f, "EQUITY"),
            AssetKind::Crypto => write!(f, "CRYPTO"),
        }
    }
}

/// How the returned quote was obtained.
///
/// A stale quote must always carry [`ProviderStatus::Fallback`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    /// Freshly fetched from the provider on this request.
    Live,
    /// Served from the short-TTL cache.
    Cached,
    /// Served from the long-TTL last-known-good entry after the provider
    /// failed.
    Fallback,
}

/// A single result from a provider symbol search.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub symbol: String,
    pub name: String,
    pub asset_kind: AssetKind,
    pub exchange: Option<String>,
    pub provider: String,
}
