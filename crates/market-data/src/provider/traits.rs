//! Quote provider trait definition.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::{AssetKind, PriceQuote, SearchResult};

/// Trait for market data providers.
///
/// Implement this trait to add support for a new quote source. The gateway
/// routes requests to the first provider whose [`supports`](Self::supports)
/// accepts the asset kind, and owns all retry/backoff behavior - providers
/// should fail fast with a well-classified [`MarketDataError`].
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "YAHOO" or "COINGECKO". Used for
    /// logging and stamped on quotes as provenance.
    fn id(&self) -> &'static str;

    /// Whether this provider can price the given asset kind.
    fn supports(&self, kind: AssetKind) -> bool;

    /// Fetch the latest quote for a symbol.
    ///
    /// `market` is the caller-side market code (e.g. "US", "VN") used for
    /// provider-specific symbol mapping. The returned quote must be marked
    /// live with this provider's id.
    async fn fetch_quote(
        &self,
        symbol: &str,
        market: Option<&str>,
    ) -> Result<PriceQuote, MarketDataError>;

    /// Fetch the closing exchange rate between two currencies on a date.
    ///
    /// Default implementation returns `NotSupported`.
    async fn fetch_historical_rate(
        &self,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Result<Decimal, MarketDataError> {
        let _ = (from, to, date);
        Err(MarketDataError::NotSupported {
            operation: "historical_rate".to_string(),
            provider: self.id().to_string(),
        })
    }

    /// Search for symbols matching the query.
    ///
    /// Default implementation returns `NotSupported`.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, MarketDataError> {
        let _ = query;
        Err(MarketDataError::NotSupported {
            operation: "search".to_string(),
            provider: self.id().to_string(),
        })
    }
}
