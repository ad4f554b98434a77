//! Asset models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lotfolio_market_data::AssetKind;

/// A tradeable asset known to the system.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub asset_class: AssetKind,
    /// Market code used for provider symbol mapping (e.g. "US", "VN").
    pub market: Option<String>,
    pub currency: String,
    /// Where this asset record came from (e.g. "binance", "manual").
    pub source: Option<String>,
}

/// Insert shape for a new asset.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewAsset {
    pub symbol: String,
    pub name: String,
    pub asset_class: AssetKind,
    pub market: Option<String>,
    pub currency: String,
    pub source: Option<String>,
}

impl NewAsset {
    /// A crypto asset discovered during an exchange sync; named after its
    /// symbol until richer metadata arrives.
    pub fn synced_crypto(symbol: &str, source: &str) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            name: symbol.to_uppercase(),
            asset_class: AssetKind::Crypto,
            market: None,
            currency: "USD".to_string(),
            source: Some(source.to_string()),
        }
    }

    pub fn into_asset(self) -> Asset {
        Asset {
            id: Uuid::new_v4().to_string(),
            symbol: self.symbol,
            name: self.name,
            asset_class: self.asset_class,
            market: self.market,
            currency: self.currency,
            source: self.source,
        }
    }
}
