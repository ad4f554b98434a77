//! Transaction models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::Error;

/// Kind of a recorded transaction.
///
/// `Sync` is a synthetic full-state snapshot written by the sync
/// orchestrator: it restates the total current balance of an asset, it is
/// not a delta.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Buy,
    Sell,
    Sync,
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BUY" => Ok(TransactionType::Buy),
            "SELL" => Ok(TransactionType::Sell),
            "SYNC" => Ok(TransactionType::Sync),
            other => Err(Error::Validation(format!(
                "Unknown transaction type: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Buy => write!(f, "BUY"),
            TransactionType::Sell => write!(f, "SELL"),
            TransactionType::Sync => write!(f, "SYNC"),
        }
    }
}

/// A recorded buy/sell/sync event.
///
/// Immutable once created; ledger replay orders transactions by
/// `transaction_date`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub portfolio_id: String,
    pub asset_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub fee: Decimal,
    /// Rate converting the transaction currency into the ledger's
    /// accounting currency. 1 when no conversion applies.
    pub exchange_rate: Decimal,
    pub transaction_date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Insert shape for a new transaction.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    /// Defaults to a fresh v4 uuid when absent.
    pub id: Option<String>,
    pub portfolio_id: String,
    pub asset_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub fee: Decimal,
    pub exchange_rate: Option<Decimal>,
    pub transaction_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl NewTransaction {
    /// Materialize into a full transaction, filling defaults.
    pub fn into_transaction(self) -> Transaction {
        Transaction {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            portfolio_id: self.portfolio_id,
            asset_id: self.asset_id,
            kind: self.kind,
            quantity: self.quantity,
            unit_price: self.unit_price,
            fee: self.fee,
            exchange_rate: self.exchange_rate.unwrap_or(Decimal::ONE),
            transaction_date: self.transaction_date.unwrap_or_else(Utc::now),
            notes: self.notes,
        }
    }
}
