//! Data models for the market data crate.

mod quote;
mod types;

pub use quote::PriceQuote;
pub use types::{AssetKind, ProviderStatus, SearchResult};
