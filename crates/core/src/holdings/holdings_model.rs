//! Valued position models returned to callers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use lotfolio_market_data::{AssetKind, ProviderStatus};

use crate::transactions::Transaction;

/// Where a holding's price came from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PriceSource {
    /// A quote from the market-data gateway, live or cached.
    MarketData,
    /// The unit price of the asset's most recent transaction. Used when no
    /// quote could be resolved at all.
    LastTransaction,
}

/// One asset's valued position within a portfolio.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub asset_id: String,
    pub symbol: String,
    pub name: String,
    pub asset_class: AssetKind,
    pub market: Option<String>,
    pub currency: String,
    pub total_quantity: Decimal,
    pub avg_cost: Decimal,
    pub price: Decimal,
    pub value: Decimal,
    pub unrealized_pl: Decimal,
    /// Unrealized gain as a percentage of cost basis; zero when the cost
    /// basis itself is zero.
    pub pl_percent: Decimal,
    pub realized_pl: Decimal,
    /// Carried over from the ledger: a sell in this asset's history
    /// exceeded the open quantity and was clamped.
    pub oversold: bool,
    pub data_source: PriceSource,
    pub provider_status: Option<ProviderStatus>,
    pub is_stale: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Portfolio-level totals across all holdings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub net_worth: Decimal,
    pub total_gain: Decimal,
    pub unrealized_pl: Decimal,
    pub realized_pl: Decimal,
    pub total_cost_basis: Decimal,
}

/// Drill-down view of one asset: its valued holding plus the transactions
/// that produced it.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AssetDetails {
    pub holding: Holding,
    pub transactions: Vec<Transaction>,
    /// (unrealized + realized) / cost basis, as a percentage.
    pub total_return_percent: Decimal,
}
