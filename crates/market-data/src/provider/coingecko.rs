//! CoinGecko quote provider for cryptocurrencies.
//!
//! CoinGecko prices coins by an internal id (`bitcoin`, not `BTC`), so the
//! provider keeps a symbol-to-id mapping built from `/coins/list` and cached
//! for 24 hours in the shared cache store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use num_traits::FromPrimitive;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::cache::CacheStore;
use crate::constants::{COIN_ID_MAP_TTL_SECS, REQUEST_TIMEOUT_SECS};
use crate::errors::MarketDataError;
use crate::models::{AssetKind, PriceQuote, ProviderStatus, SearchResult};
use crate::provider::QuoteProvider;

const BASE_URL: &str = "https://api.coingecko.com/api/v3";
const PROVIDER_ID: &str = "COINGECKO";
const ID_MAP_CACHE_KEY: &str = "coingecko:id-map";

// ============================================================================
// API Response Structures
// ============================================================================

/// One entry from /coins/list.
#[derive(Debug, Deserialize)]
struct CoinListEntry {
    id: String,
    symbol: String,
}

/// Per-coin payload from /simple/price.
#[derive(Debug, Deserialize)]
struct SimplePrice {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<SearchCoin>,
}

#[derive(Debug, Deserialize)]
struct SearchCoin {
    symbol: String,
    name: String,
}

// ============================================================================
// CoinGeckoProvider
// ============================================================================

/// CoinGecko market data provider.
///
/// Free tier allows roughly 30 calls per minute; the gateway's cache keeps
/// the request volume well under that.
pub struct CoinGeckoProvider {
    client: Client,
    cache: Arc<dyn CacheStore>,
}

impl CoinGeckoProvider {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, cache }
    }

    /// Make a GET request, classifying transport and HTTP failures.
    async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, MarketDataError> {
        let url = format!("{}{}", BASE_URL, endpoint);
        debug!("CoinGecko request: {}", endpoint);

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MarketDataError::Timeout {
                        provider: PROVIDER_ID.to_string(),
                    }
                } else {
                    MarketDataError::ProviderError {
                        provider: PROVIDER_ID.to_string(),
                        message: format!("Request failed: {}", e),
                    }
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {} - {}", status, body),
            });
        }

        response
            .json()
            .await
            .map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse response: {}", e),
            })
    }

    /// Resolve a ticker symbol to the CoinGecko coin id.
    ///
    /// The full mapping is fetched once from /coins/list and cached for 24h.
    /// When several coins share a symbol the first listing wins, which for
    /// the major coins is the canonical one.
    async fn resolve_coin_id(&self, symbol: &str) -> Result<String, MarketDataError> {
        let symbol_lower = symbol.to_lowercase();

        if let Some(raw) = self.cache.get(ID_MAP_CACHE_KEY).await {
            match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(map) => {
                    return map
                        .get(&symbol_lower)
                        .cloned()
                        .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()));
                }
                Err(e) => {
                    warn!("Discarding corrupt coin id map cache entry: {}", e);
                    self.cache.del(ID_MAP_CACHE_KEY).await;
                }
            }
        }

        let entries: Vec<CoinListEntry> = self.fetch_json("/coins/list", &[]).await?;
        let mut map: HashMap<String, String> = HashMap::with_capacity(entries.len());
        for entry in entries {
            map.entry(entry.symbol.to_lowercase()).or_insert(entry.id);
        }

        match serde_json::to_string(&map) {
            Ok(serialized) => {
                self.cache
                    .set(ID_MAP_CACHE_KEY, serialized, COIN_ID_MAP_TTL_SECS)
                    .await;
            }
            Err(e) => warn!("Failed to serialize coin id map: {}", e),
        }

        map.get(&symbol_lower)
            .cloned()
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))
    }
}

#[async_trait]
impl QuoteProvider for CoinGeckoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn supports(&self, kind: AssetKind) -> bool {
        matches!(kind, AssetKind::Crypto)
    }

    async fn fetch_quote(
        &self,
        symbol: &str,
        _market: Option<&str>,
    ) -> Result<PriceQuote, MarketDataError> {
        let coin_id = self.resolve_coin_id(symbol).await?;

        let prices: HashMap<String, SimplePrice> = self
            .fetch_json(
                "/simple/price",
                &[
                    ("ids", coin_id.as_str()),
                    ("vs_currencies", "usd"),
                    ("include_24hr_change", "true"),
                ],
            )
            .await?;

        let entry = prices
            .get(&coin_id)
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;

        let price_raw = entry
            .usd
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;
        let price = Decimal::from_f64(price_raw).ok_or_else(|| MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!("Non-finite price value: {}", price_raw),
        })?;

        let change_percent24h = entry.usd_24h_change.and_then(Decimal::from_f64);
        let change24h = change_percent24h.and_then(|pct| derive_change24h(price, pct));

        Ok(PriceQuote {
            symbol: symbol.to_uppercase(),
            price,
            change24h,
            change_percent24h,
            previous_close: None,
            provider: PROVIDER_ID.to_string(),
            provider_status: ProviderStatus::Live,
            is_stale: false,
            last_updated: Utc::now(),
        })
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, MarketDataError> {
        let payload: SearchResponse = self.fetch_json("/search", &[("query", query)]).await?;

        Ok(payload
            .coins
            .into_iter()
            .map(|coin| SearchResult {
                symbol: coin.symbol.to_uppercase(),
                name: coin.name,
                asset_kind: AssetKind::Crypto,
                exchange: None,
                provider: PROVIDER_ID.to_string(),
            })
            .collect())
    }
}

/// Absolute 24h change derived from the percent change: with the current
/// price P and percent c, the 24h-ago price was P / (1 + c/100). A percent
/// at or below -100 makes that prior price zero or negative, so no change
/// can be derived from it.
fn derive_change24h(price: Decimal, pct: Decimal) -> Option<Decimal> {
    let divisor = Decimal::ONE_HUNDRED + pct;
    if divisor <= Decimal::ZERO {
        return None;
    }
    Some(price * pct / divisor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;

    #[tokio::test]
    async fn test_resolve_coin_id_from_cached_map() {
        let cache = Arc::new(MemoryCache::new());
        let map = r#"{"btc":"bitcoin","eth":"ethereum"}"#;
        cache
            .set(ID_MAP_CACHE_KEY, map.to_string(), 3600)
            .await;

        let provider = CoinGeckoProvider::new(cache);
        assert_eq!(provider.resolve_coin_id("BTC").await.unwrap(), "bitcoin");
        assert_eq!(provider.resolve_coin_id("eth").await.unwrap(), "ethereum");
    }

    #[tokio::test]
    async fn test_resolve_unknown_symbol_is_not_found() {
        let cache = Arc::new(MemoryCache::new());
        cache
            .set(ID_MAP_CACHE_KEY, r#"{"btc":"bitcoin"}"#.to_string(), 3600)
            .await;

        let provider = CoinGeckoProvider::new(cache);
        let err = provider.resolve_coin_id("NOPE").await.unwrap_err();
        assert!(matches!(err, MarketDataError::SymbolNotFound(_)));
    }

    #[test]
    fn test_supports_crypto_only() {
        let provider = CoinGeckoProvider::new(Arc::new(MemoryCache::new()));
        assert!(provider.supports(AssetKind::Crypto));
        assert!(!provider.supports(AssetKind::Equity));
    }

    #[test]
    fn test_derive_change24h_skips_total_loss_percent() {
        use rust_decimal_macros::dec;

        // 25% up from 80 is an absolute change of 20.
        assert_eq!(derive_change24h(dec!(100), dec!(25)), Some(dec!(20)));
        // At -100 the 24h-ago price is zero; below it the divisor flips
        // sign. Neither yields a usable change.
        assert_eq!(derive_change24h(dec!(100), dec!(-100)), None);
        assert_eq!(derive_change24h(dec!(100), dec!(-150)), None);
    }

    #[test]
    fn test_simple_price_parsing() {
        let json = r#"{"bitcoin":{"usd":64250.5,"usd_24h_change":-1.8}}"#;
        let parsed: HashMap<String, SimplePrice> = serde_json::from_str(json).unwrap();
        let btc = &parsed["bitcoin"];
        assert_eq!(btc.usd, Some(64250.5));
        assert_eq!(btc.usd_24h_change, Some(-1.8));
    }
}
