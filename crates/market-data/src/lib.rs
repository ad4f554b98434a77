//! Lotfolio Market Data Crate
//!
//! This crate turns asset identifiers into prices while shielding callers
//! from provider flakiness.
//!
//! # Overview
//!
//! The market data crate supports:
//! - Multiple asset kinds: equities and crypto
//! - Multiple providers: Yahoo Finance (equities, FX) and CoinGecko (crypto)
//! - Cache-aside quote resolution with TTL'd entries
//! - Retry with exponential backoff and jitter
//! - Graceful staleness fallback when providers are down
//!
//! # Request flow
//!
//! ```text
//! get_quote(symbol, market, kind)
//!        |
//!        v
//!   +---------+  hit   +--------------+
//!   |  cache  | -----> | cached quote |
//!   +---------+        +--------------+
//!        | miss
//!        v
//!   +----------+ success  +------------------------------+
//!   | provider | -------> | live quote (cache + fallback) |
//!   +----------+          +------------------------------+
//!        | exhausted retries
//!        v
//!   +----------------+ present +---------------------------+
//!   | fallback cache | ------> | stale quote (flagged)     |
//!   +----------------+         +---------------------------+
//!        | absent
//!        v
//!      None
//! ```

pub mod cache;
pub mod constants;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod provider;


pub use cache::{CacheStore, MemoryCache};
pub use errors::{MarketDataError, RetryClass};
pub use gateway::{GatewayConfig, PriceGateway, RetryPolicy};
pub use models::{AssetKind, PriceQuote, ProviderStatus, SearchResult};
pub use provider::coingecko::CoinGeckoProvider;
pub use provider::yahoo::YahooProvider;
pub use provider::QuoteProvider;
