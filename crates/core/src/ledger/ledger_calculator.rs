//! FIFO lot matching over a transaction history.
//!
//! Replaying the same transactions always yields the same [`LedgerState`];
//! nothing here reads the clock or any external state.

use std::collections::HashMap;

use log::warn;
use rust_decimal::Decimal;

use crate::constants::SELL_EPSILON;
use crate::ledger::ledger_model::{LedgerState, Lot};
use crate::transactions::{Transaction, TransactionType};

pub struct LedgerCalculator;

impl LedgerCalculator {
    /// Folds one transaction into the state.
    pub fn apply(state: &mut LedgerState, tx: &Transaction) {
        match tx.kind {
            TransactionType::Buy => Self::apply_buy(state, tx),
            TransactionType::Sell => Self::apply_sell(state, tx),
            TransactionType::Sync => Self::apply_sync(state, tx),
        }
        state.last_price = Some(tx.unit_price);
    }

    /// A buy opens a new lot at the back of the queue. Fees are capitalized
    /// into the lot's cost basis.
    fn apply_buy(state: &mut LedgerState, tx: &Transaction) {
        if tx.quantity <= Decimal::ZERO {
            return;
        }
        let cost = (tx.quantity * tx.unit_price + tx.fee) * tx.exchange_rate;
        state.lots.push_back(Lot {
            quantity: tx.quantity,
            cost_basis: cost,
        });
    }

    /// A sell consumes lots front-to-back. A partially consumed lot gives up
    /// cost basis in proportion to the quantity taken.
    ///
    /// Proceeds always reflect the full sale. Selling more than the open
    /// quantity only clamps the lot drain, so an oversell removes the cost
    /// that existed and flags the state instead of going negative.
    fn apply_sell(state: &mut LedgerState, tx: &Transaction) {
        if tx.quantity <= Decimal::ZERO {
            return;
        }
        let available = state.total_quantity();
        let mut remaining = tx.quantity;
        if remaining > available + SELL_EPSILON {
            warn!(
                "Oversell on asset {}: selling {} with only {} held, clamping",
                tx.asset_id, tx.quantity, available
            );
            state.oversold = true;
            remaining = available;
        }

        let mut consumed_cost = Decimal::ZERO;
        while remaining > SELL_EPSILON {
            let Some(front) = state.lots.front_mut() else {
                break;
            };
            if front.quantity <= remaining + SELL_EPSILON {
                remaining -= front.quantity;
                consumed_cost += front.cost_basis;
                state.lots.pop_front();
            } else {
                let share = front.cost_basis * (remaining / front.quantity);
                front.cost_basis -= share;
                front.quantity -= remaining;
                consumed_cost += share;
                remaining = Decimal::ZERO;
            }
        }

        let proceeds = (tx.quantity * tx.unit_price - tx.fee) * tx.exchange_rate;
        state.realized_pl += proceeds - consumed_cost;
    }

    /// A sync restates the whole position to the reported snapshot: open lots
    /// are replaced by a single lot at the reported quantity and price.
    /// Realized P&L from earlier activity is kept.
    fn apply_sync(state: &mut LedgerState, tx: &Transaction) {
        state.lots.clear();
        if tx.quantity > Decimal::ZERO {
            state.lots.push_back(Lot {
                quantity: tx.quantity,
                cost_basis: tx.quantity * tx.unit_price * tx.exchange_rate,
            });
        }
    }
}

/// Replays a transaction history from an empty state.
///
/// Transactions are ordered by date, with ids breaking ties so same-day
/// activity replays the same way every time.
pub fn replay(transactions: &[Transaction]) -> LedgerState {
    let mut ordered: Vec<&Transaction> = transactions.iter().collect();
    ordered.sort_by(|a, b| {
        a.transaction_date
            .cmp(&b.transaction_date)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut state = LedgerState::default();
    for tx in ordered {
        LedgerCalculator::apply(&mut state, tx);
    }
    state
}

/// Replays a mixed-asset history into one state per asset.
pub fn replay_by_asset(transactions: &[Transaction]) -> HashMap<String, LedgerState> {
    let mut by_asset: HashMap<String, Vec<Transaction>> = HashMap::new();
    for tx in transactions {
        by_asset
            .entry(tx.asset_id.clone())
            .or_default()
            .push(tx.clone());
    }
    by_asset
        .into_iter()
        .map(|(asset_id, txs)| {
            let state = replay(&txs);
            (asset_id, state)
        })
        .collect()
}
