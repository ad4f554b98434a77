//! Binance spot adapter.
//!
//! Account balances come from the signed `/api/v3/account` endpoint; USD
//! valuation uses the public `/api/v3/ticker/price` snapshot. Stablecoins
//! are valued 1:1 instead of going through a ticker.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;

use lotfolio_core::ExchangeCredentials;

use super::adapter_model::{AdapterError, CredentialValidation, ExchangeBalance};
use super::adapter_traits::ExchangeAdapter;

const DEFAULT_BASE_URL: &str = "https://api.binance.com";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const RECV_WINDOW_MS: u64 = 5_000;

/// Assets pegged to the dollar; valued 1:1 without a ticker lookup.
const STABLECOINS: [&str; 4] = ["USDT", "USDC", "BUSD", "USD"];

/// Positions worth less than this many USD are dropped as dust.
const DUST_THRESHOLD_USD: Decimal = Decimal::ONE;

type HmacSha256 = Hmac<Sha256>;

#[derive(Deserialize)]
struct AccountResponse {
    balances: Vec<RawBalance>,
}

#[derive(Deserialize)]
struct RawBalance {
    asset: String,
    free: String,
    locked: String,
}

#[derive(Deserialize)]
struct TickerPrice {
    symbol: String,
    price: String,
}

pub struct BinanceAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl Default for BinanceAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl BinanceAdapter {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the adapter at a different host. Used against testnets and in
    /// tests.
    pub fn with_base_url(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn sign(secret: &str, query: &str) -> Result<String, AdapterError> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| AdapterError::Authentication("unusable API secret".to_string()))?;
        mac.update(query.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    async fn signed_get(
        &self,
        path: &str,
        credentials: &ExchangeCredentials,
    ) -> Result<reqwest::Response, AdapterError> {
        let query = format!(
            "timestamp={}&recvWindow={}",
            Utc::now().timestamp_millis(),
            RECV_WINDOW_MS
        );
        let signature = Self::sign(&credentials.api_secret, &query)?;
        let url = format!("{}{}?{}&signature={}", self.base_url, path, query, signature);

        let response = self
            .client
            .get(&url)
            .header("X-MBX-APIKEY", &credentials.api_key)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_error_status(status.as_u16(), &body));
        }
        Ok(response)
    }

    async fn fetch_ticker_prices(&self) -> Result<HashMap<String, Decimal>, AdapterError> {
        let url = format!("{}/api/v3/ticker/price", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_error_status(status.as_u16(), &body));
        }

        let tickers: Vec<TickerPrice> = response
            .json()
            .await
            .map_err(|e| AdapterError::InvalidResponse(e.to_string()))?;

        Ok(tickers
            .into_iter()
            .filter_map(|t| t.price.parse::<Decimal>().ok().map(|p| (t.symbol, p)))
            .collect())
    }
}

#[async_trait]
impl ExchangeAdapter for BinanceAdapter {
    fn exchange_id(&self) -> &'static str {
        "binance"
    }

    async fn validate_credentials(
        &self,
        credentials: &ExchangeCredentials,
    ) -> Result<CredentialValidation, AdapterError> {
        match self.signed_get("/api/v3/account", credentials).await {
            Ok(_) => Ok(CredentialValidation::ok()),
            Err(AdapterError::Authentication(message)) => {
                Ok(CredentialValidation::rejected(message))
            }
            Err(err) => Err(err),
        }
    }

    async fn fetch_balances(
        &self,
        credentials: &ExchangeCredentials,
    ) -> Result<Vec<ExchangeBalance>, AdapterError> {
        let account: AccountResponse = self
            .signed_get("/api/v3/account", credentials)
            .await?
            .json()
            .await
            .map_err(|e| AdapterError::InvalidResponse(e.to_string()))?;

        let prices = self.fetch_ticker_prices().await?;
        Ok(value_balances(account.balances, &prices))
    }
}

fn map_transport_error(err: reqwest::Error) -> AdapterError {
    if err.is_timeout() {
        AdapterError::ExchangeUnavailable("request timed out".to_string())
    } else {
        AdapterError::Network(err.to_string())
    }
}

fn map_error_status(status: u16, body: &str) -> AdapterError {
    match status {
        401 | 403 => AdapterError::Authentication(format!("HTTP {}: {}", status, body)),
        418 | 429 => AdapterError::RateLimited(format!("HTTP {}: {}", status, body)),
        500..=599 => AdapterError::ExchangeUnavailable(format!("HTTP {}", status)),
        _ => AdapterError::InvalidResponse(format!("HTTP {}: {}", status, body)),
    }
}

/// Turns raw account balances into USD-valued positions. Zero balances,
/// assets without a USDT ticker, and dust under one dollar are dropped.
fn value_balances(
    raw: Vec<RawBalance>,
    prices: &HashMap<String, Decimal>,
) -> Vec<ExchangeBalance> {
    let mut balances = Vec::new();
    for entry in raw {
        let (Ok(free), Ok(locked)) = (
            entry.free.parse::<Decimal>(),
            entry.locked.parse::<Decimal>(),
        ) else {
            warn!("Skipping unparsable balance for {}", entry.asset);
            continue;
        };
        let total = free + locked;
        if total <= Decimal::ZERO {
            continue;
        }

        let price = if STABLECOINS.contains(&entry.asset.as_str()) {
            Decimal::ONE
        } else {
            match prices.get(&format!("{}USDT", entry.asset)) {
                Some(price) => *price,
                None => {
                    debug!("No USDT ticker for {}, skipping", entry.asset);
                    continue;
                }
            }
        };

        let usd_value = total * price;
        if usd_value < DUST_THRESHOLD_USD {
            continue;
        }

        balances.push(ExchangeBalance {
            asset: entry.asset,
            free,
            locked,
            total,
            usd_value,
        });
    }
    balances
}
