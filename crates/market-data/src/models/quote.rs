//! Quote model returned by the gateway.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::ProviderStatus;

/// A priced snapshot of an asset.
///
/// Quotes are ephemeral: they are recomputed per request and held only in
/// the gateway's cache. The `provider_status` / `is_stale` pair tells the
/// caller how much to trust the number.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    /// The canonical (caller-side) symbol, not the provider symbol.
    pub symbol: String,
    pub price: Decimal,
    /// Absolute change over the last 24h / trading day, when the provider
    /// reports it.
    pub change24h: Option<Decimal>,
    /// Percent change over the last 24h / trading day.
    pub change_percent24h: Option<Decimal>,
    pub previous_close: Option<Decimal>,
    /// Provider id that produced the price, or `"cached"` for fallbacks.
    pub provider: String,
    pub provider_status: ProviderStatus,
    /// True only when served from the long-TTL fallback entry.
    pub is_stale: bool,
    pub last_updated: DateTime<Utc>,
}

impl PriceQuote {
    /// Re-label a cache hit of a previously live quote.
    pub fn as_cached(mut self) -> Self {
        self.provider_status = ProviderStatus::Cached;
        self
    }

    /// Re-label a last-known-good entry served because the provider is
    /// unreachable. Keeps the original `last_updated` so callers can see
    /// how old the price is.
    pub fn as_stale_fallback(mut self) -> Self {
        self.provider = "cached".to_string();
        self.provider_status = ProviderStatus::Fallback;
        self.is_stale = true;
        self
    }
}
