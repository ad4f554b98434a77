//! Cache-aside price gateway with retry, multi-provider routing, and
//! staleness fallback.
//!
//! The gateway is the only entry point callers use for pricing. Provider
//! failures never escape it: callers always receive a quote (possibly
//! flagged stale) or `None`.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use log::{debug, info, warn};
use rand::Rng;
use rust_decimal::Decimal;

use crate::cache::CacheStore;
use crate::constants::{
    DEFAULT_BASE_DELAY_MS, DEFAULT_JITTER_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY_MS,
    FALLBACK_TTL_SECS, HISTORICAL_RATE_TTL_SECS, QUOTE_TTL_SECS, SEARCH_TTL_SECS,
};
use crate::errors::{MarketDataError, RetryClass};
use crate::models::{AssetKind, PriceQuote, SearchResult};
use crate::provider::QuoteProvider;

/// Exponential backoff settings for transient provider failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total fetch attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles each retry.
    pub base_delay: Duration,
    /// Cap applied to the exponential delay.
    pub max_delay: Duration,
    /// Upper bound of the uniform random jitter added to each delay.
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
            jitter: Duration::from_millis(DEFAULT_JITTER_MS),
        }
    }
}

impl RetryPolicy {
    /// Delay to sleep after the given zero-based failed attempt.
    fn delay_for(&self, attempt: u32) -> Duration {
        let exponential = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay);
        let jitter_ms = if self.jitter.is_zero() {
            0
        } else {
            rand::thread_rng().gen_range(0..=self.jitter.as_millis() as u64)
        };
        exponential + Duration::from_millis(jitter_ms)
    }
}

/// Gateway configuration. Defaults match the documented TTLs.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub quote_ttl_secs: u64,
    pub fallback_ttl_secs: u64,
    pub historical_rate_ttl_secs: u64,
    pub search_ttl_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            quote_ttl_secs: QUOTE_TTL_SECS,
            fallback_ttl_secs: FALLBACK_TTL_SECS,
            historical_rate_ttl_secs: HISTORICAL_RATE_TTL_SECS,
            search_ttl_secs: SEARCH_TTL_SECS,
            retry: RetryPolicy::default(),
        }
    }
}

/// Cache-aside, retrying, multi-provider price resolver.
pub struct PriceGateway {
    providers: Vec<Arc<dyn QuoteProvider>>,
    cache: Arc<dyn CacheStore>,
    config: GatewayConfig,
}

impl PriceGateway {
    /// Create a gateway with default configuration.
    ///
    /// Providers are consulted in order; the first one whose
    /// [`QuoteProvider::supports`] accepts the asset kind handles the
    /// request.
    pub fn new(providers: Vec<Arc<dyn QuoteProvider>>, cache: Arc<dyn CacheStore>) -> Self {
        Self::with_config(providers, cache, GatewayConfig::default())
    }

    pub fn with_config(
        providers: Vec<Arc<dyn QuoteProvider>>,
        cache: Arc<dyn CacheStore>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            providers,
            cache,
            config,
        }
    }

    /// Resolve the current price for an asset.
    ///
    /// Returns `Ok(None)` when the price is unobtainable (provider down and
    /// no fallback entry); provider failures are never surfaced as errors.
    /// Malformed input is rejected synchronously with a validation error.
    pub async fn get_quote(
        &self,
        symbol: &str,
        market: Option<&str>,
        kind: AssetKind,
    ) -> Result<Option<PriceQuote>, MarketDataError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(MarketDataError::Validation("empty symbol".to_string()));
        }

        let cache_key = Self::quote_key(kind, symbol);
        if let Some(raw) = self.cache.get(&cache_key).await {
            match serde_json::from_str::<PriceQuote>(&raw) {
                Ok(quote) => {
                    debug!("Quote cache hit for {}", cache_key);
                    return Ok(Some(quote.as_cached()));
                }
                Err(e) => {
                    warn!("Discarding corrupt quote cache entry {}: {}", cache_key, e);
                    self.cache.del(&cache_key).await;
                }
            }
        }

        let provider = match self.route(kind) {
            Some(p) => p,
            None => {
                warn!("No provider available for asset kind {}", kind);
                return Ok(None);
            }
        };

        match self.fetch_with_retry(provider.as_ref(), symbol, market).await {
            Ok(quote) => {
                self.store_quote(kind, symbol, &quote).await;
                Ok(Some(quote))
            }
            Err(e) => {
                warn!(
                    "Quote fetch for {} failed after retries: {}. Checking fallback cache.",
                    symbol, e
                );
                Ok(self.fallback_quote(kind, symbol).await)
            }
        }
    }

    /// Closing exchange rate between two currencies on a date.
    ///
    /// Same-currency requests short-circuit to 1. Rates are cached for a
    /// long TTL since historical values are immutable. Provider failure
    /// degrades to `None`.
    pub async fn get_historical_rate(
        &self,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Result<Option<Decimal>, MarketDataError> {
        let from = from.trim().to_uppercase();
        let to = to.trim().to_uppercase();
        if from.len() != 3 || to.len() != 3 {
            return Err(MarketDataError::Validation(format!(
                "currency codes must be 3 characters: '{}' -> '{}'",
                from, to
            )));
        }

        if from == to {
            return Ok(Some(Decimal::ONE));
        }

        let cache_key = format!("fx:rate:{}:{}:{}", from, to, date.format("%Y-%m-%d"));
        if let Some(raw) = self.cache.get(&cache_key).await {
            if let Ok(rate) = raw.parse::<Decimal>() {
                debug!("FX rate cache hit for {}", cache_key);
                return Ok(Some(rate));
            }
            self.cache.del(&cache_key).await;
        }

        // Historical FX goes through the equity-capable provider (Yahoo).
        let provider = match self.route(AssetKind::Equity) {
            Some(p) => p,
            None => return Ok(None),
        };

        match provider.fetch_historical_rate(&from, &to, date).await {
            Ok(rate) => {
                self.cache
                    .set(
                        &cache_key,
                        rate.to_string(),
                        self.config.historical_rate_ttl_secs,
                    )
                    .await;
                Ok(Some(rate))
            }
            Err(e) => {
                warn!("Historical rate {}->{} on {} failed: {}", from, to, date, e);
                Ok(None)
            }
        }
    }

    /// Search providers for assets matching the query.
    ///
    /// Results are cached briefly; failures degrade to an empty list.
    pub async fn search_assets(&self, query: &str, kind: AssetKind) -> Vec<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let cache_key = format!("search:{}:{}", kind, query.to_lowercase());
        if let Some(raw) = self.cache.get(&cache_key).await {
            if let Ok(results) = serde_json::from_str::<Vec<SearchResult>>(&raw) {
                return results;
            }
        }

        let provider = match self.route(kind) {
            Some(p) => p,
            None => return Vec::new(),
        };

        match provider.search(query).await {
            Ok(results) => {
                if !results.is_empty() {
                    if let Ok(serialized) = serde_json::to_string(&results) {
                        self.cache
                            .set(&cache_key, serialized, self.config.search_ttl_secs)
                            .await;
                    }
                }
                results
            }
            Err(e) => {
                warn!("Search for '{}' ({}) failed: {}", query, kind, e);
                Vec::new()
            }
        }
    }

    /// Drop the cached quote for a symbol, forcing the next request to hit
    /// the provider. The fallback entry is kept.
    pub async fn invalidate_quote(&self, symbol: &str, kind: AssetKind) {
        self.cache.del(&Self::quote_key(kind, symbol)).await;
    }

    /// Drop every cached quote, live and fallback. Used when switching
    /// provider configuration at runtime.
    pub async fn invalidate_all_quotes(&self) {
        self.cache.del_prefix("quote:").await;
    }

    fn route(&self, kind: AssetKind) -> Option<&Arc<dyn QuoteProvider>> {
        self.providers.iter().find(|p| p.supports(kind))
    }

    fn quote_key(kind: AssetKind, symbol: &str) -> String {
        format!("quote:{}:{}", kind, symbol.to_uppercase())
    }

    fn fallback_key(kind: AssetKind, symbol: &str) -> String {
        format!("quote:fallback:{}:{}", kind, symbol.to_uppercase())
    }

    /// Fetch from one provider, retrying transient failures with capped
    /// exponential backoff plus jitter. Terminal errors short-circuit.
    async fn fetch_with_retry(
        &self,
        provider: &dyn QuoteProvider,
        symbol: &str,
        market: Option<&str>,
    ) -> Result<PriceQuote, MarketDataError> {
        let policy = &self.config.retry;
        let mut attempt = 0u32;

        loop {
            match provider.fetch_quote(symbol, market).await {
                Ok(quote) => {
                    if attempt > 0 {
                        info!(
                            "Quote fetch for {} from {} succeeded on attempt {}",
                            symbol,
                            provider.id(),
                            attempt + 1
                        );
                    }
                    return Ok(quote);
                }
                Err(e) => match e.retry_class() {
                    RetryClass::Never => return Err(e),
                    RetryClass::WithBackoff => {
                        attempt += 1;
                        if attempt >= policy.max_attempts {
                            warn!(
                                "Giving up on {} after {} attempts: {}",
                                symbol, attempt, e
                            );
                            return Err(MarketDataError::Exhausted {
                                symbol: symbol.to_string(),
                            });
                        }
                        let delay = policy.delay_for(attempt - 1);
                        debug!(
                            "Attempt {} for {} failed ({}); retrying in {:?}",
                            attempt, symbol, e, delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                },
            }
        }
    }

    /// Every successful live fetch writes both the short-TTL entry and the
    /// long-TTL last-known-good entry.
    async fn store_quote(&self, kind: AssetKind, symbol: &str, quote: &PriceQuote) {
        match serde_json::to_string(quote) {
            Ok(serialized) => {
                self.cache
                    .set(
                        &Self::quote_key(kind, symbol),
                        serialized.clone(),
                        self.config.quote_ttl_secs,
                    )
                    .await;
                self.cache
                    .set(
                        &Self::fallback_key(kind, symbol),
                        serialized,
                        self.config.fallback_ttl_secs,
                    )
                    .await;
            }
            Err(e) => warn!("Failed to serialize quote for {}: {}", symbol, e),
        }
    }

    async fn fallback_quote(&self, kind: AssetKind, symbol: &str) -> Option<PriceQuote> {
        let raw = self.cache.get(&Self::fallback_key(kind, symbol)).await?;
        match serde_json::from_str::<PriceQuote>(&raw) {
            Ok(quote) => {
                info!("Serving stale fallback quote for {}", symbol);
                Some(quote.as_stale_fallback())
            }
            Err(e) => {
                warn!("Corrupt fallback entry for {}: {}", symbol, e);
                None
            }
        }
    }
}
