//! Yahoo Finance quote provider.
//!
//! Talks to the public chart and search endpoints:
//! - Latest quotes via `/v8/finance/chart/{symbol}` metadata
//! - Historical FX rates via the same endpoint with `FROMTO=X` symbols
//! - Symbol search via `/v1/finance/search`
//!
//! Symbols are mapped with market suffixes before hitting the API
//! (e.g. `VIC` on the VN market becomes `VIC.VN`).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use log::debug;
use num_traits::FromPrimitive;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::constants::REQUEST_TIMEOUT_SECS;
use crate::errors::MarketDataError;
use crate::models::{AssetKind, PriceQuote, ProviderStatus, SearchResult};
use crate::provider::QuoteProvider;

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const PROVIDER_ID: &str = "YAHOO";

// ============================================================================
// API Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    /// Previous close for the regular session; absent for some FX symbols.
    regular_market_previous_close: Option<f64>,
    chart_previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<IndicatorQuote>,
}

#[derive(Debug, Deserialize)]
struct IndicatorQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    quotes: Vec<SearchQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuote {
    symbol: Option<String>,
    shortname: Option<String>,
    longname: Option<String>,
    exch_disp: Option<String>,
    quote_type: Option<String>,
}

// ============================================================================
// YahooProvider
// ============================================================================

/// Yahoo Finance provider for equities, ETFs, and FX rates.
pub struct YahooProvider {
    client: Client,
}

impl YahooProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("Mozilla/5.0 (compatible; lotfolio/0.3)")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Map a caller-side symbol to the Yahoo symbol, applying the market
    /// suffix when needed.
    fn map_symbol(symbol: &str, market: Option<&str>) -> String {
        let s = symbol.to_uppercase();
        match market.map(|m| m.to_uppercase()).as_deref() {
            Some("VN") => {
                if s.ends_with(".VN") {
                    s
                } else {
                    format!("{}.VN", s)
                }
            }
            Some("CRYPTO") => {
                if s.ends_with("-USD") {
                    s
                } else {
                    format!("{}-USD", s)
                }
            }
            // US and most others match directly.
            _ => s,
        }
    }

    /// GET a chart payload, classifying transport and HTTP failures.
    async fn fetch_chart(
        &self,
        symbol: &str,
        params: &[(&str, &str)],
    ) -> Result<ChartResult, MarketDataError> {
        let url = format!("{}/v8/finance/chart/{}", BASE_URL, symbol);
        debug!("Yahoo chart request for {}", symbol);

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
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {} - {}", status, body),
            });
        }

        let payload: ChartResponse =
            response
                .json()
                .await
                .map_err(|e| MarketDataError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("Failed to parse chart response: {}", e),
                })?;

        if let Some(error) = payload.chart.error {
            let code = error.code.unwrap_or_default();
            // Yahoo reports unknown symbols as a "Not Found" chart error.
            if code.eq_ignore_ascii_case("not found") {
                return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
            }
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("{}: {}", code, error.description.unwrap_or_default()),
            });
        }

        payload
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))
    }

    fn to_decimal(value: f64) -> Result<Decimal, MarketDataError> {
        Decimal::from_f64(value).ok_or_else(|| MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!("Non-finite price value: {}", value),
        })
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn supports(&self, kind: AssetKind) -> bool {
        matches!(kind, AssetKind::Equity)
    }

    async fn fetch_quote(
        &self,
        symbol: &str,
        market: Option<&str>,
    ) -> Result<PriceQuote, MarketDataError> {
        let yahoo_symbol = Self::map_symbol(symbol, market);
        let result = self
            .fetch_chart(&yahoo_symbol, &[("interval", "1d"), ("range", "1d")])
            .await?;

        let price_raw = result
            .meta
            .regular_market_price
            .ok_or_else(|| MarketDataError::SymbolNotFound(yahoo_symbol.clone()))?;
        let price = Self::to_decimal(price_raw)?;

        let previous_close = result
            .meta
            .regular_market_previous_close
            .or(result.meta.chart_previous_close)
            .and_then(Decimal::from_f64);

        let change24h = previous_close.map(|prev| price - prev);
        let change_percent24h = match (change24h, previous_close) {
            (Some(change), Some(prev)) if !prev.is_zero() => {
                Some(change / prev * Decimal::ONE_HUNDRED)
            }
            _ => None,
        };

        Ok(PriceQuote {
            symbol: symbol.to_uppercase(),
            price,
            change24h,
            change_percent24h,
            previous_close,
            provider: PROVIDER_ID.to_string(),
            provider_status: ProviderStatus::Live,
            is_stale: false,
            last_updated: Utc::now(),
        })
    }

    async fn fetch_historical_rate(
        &self,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Result<Decimal, MarketDataError> {
        let fx_symbol = format!("{}{}=X", from.to_uppercase(), to.to_uppercase());

        // One full day around the requested date; closes come back in the
        // indicators block.
        let start = Utc
            .from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
            .timestamp();
        let end = start + 86_400;
        let period1 = start.to_string();
        let period2 = end.to_string();

        let result = self
            .fetch_chart(
                &fx_symbol,
                &[
                    ("interval", "1d"),
                    ("period1", period1.as_str()),
                    ("period2", period2.as_str()),
                ],
            )
            .await?;

        let close = result
            .indicators
            .as_ref()
            .and_then(|i| i.quote.first())
            .and_then(|q| q.close.iter().flatten().next().copied())
            .or(result.meta.regular_market_price);

        match close {
            Some(rate) => Self::to_decimal(rate),
            None => Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("No rate data for {} on {}", fx_symbol, date),
            }),
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, MarketDataError> {
        let url = format!("{}/v1/finance/search", BASE_URL);
        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("quotesCount", "10"), ("newsCount", "0")])
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
                        message: format!("Search request failed: {}", e),
                    }
                }
            })?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        let payload: SearchResponse =
            response
                .json()
                .await
                .map_err(|e| MarketDataError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("Failed to parse search response: {}", e),
                })?;

        Ok(payload
            .quotes
            .into_iter()
            .filter(|q| {
                matches!(
                    q.quote_type.as_deref(),
                    Some("EQUITY") | Some("ETF")
                )
            })
            .filter_map(|q| {
                let symbol = q.symbol?;
                let name = q
                    .longname
                    .or(q.shortname)
                    .unwrap_or_else(|| symbol.clone());
                Some(SearchResult {
                    symbol,
                    name,
                    asset_kind: AssetKind::Equity,
                    exchange: q.exch_disp,
                    provider: PROVIDER_ID.to_string(),
                })
            })
            .collect())
    }
}
