//! Lot-level position state derived from a transaction history.

use std::collections::VecDeque;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An open acquisition lot. `cost_basis` is the total cost of the lot in the
/// portfolio's base currency, fees included, not a per-unit figure.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    pub quantity: Decimal,
    pub cost_basis: Decimal,
}

/// Position state for one asset after replaying its transactions.
///
/// Lots are kept in acquisition order; sells always consume from the front.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LedgerState {
    pub lots: VecDeque<Lot>,
    pub realized_pl: Decimal,
    /// Unit price of the most recent transaction, used as a valuation
    /// fallback when no live quote is available.
    pub last_price: Option<Decimal>,
    /// Set when a sell exceeded the open quantity and was clamped.
    pub oversold: bool,
}

impl LedgerState {
    pub fn total_quantity(&self) -> Decimal {
        self.lots.iter().map(|lot| lot.quantity).sum()
    }

    pub fn remaining_cost_basis(&self) -> Decimal {
        self.lots.iter().map(|lot| lot.cost_basis).sum()
    }

    pub fn average_cost(&self) -> Decimal {
        let quantity = self.total_quantity();
        if quantity.is_zero() {
            Decimal::ZERO
        } else {
            self.remaining_cost_basis() / quantity
        }
    }
}
