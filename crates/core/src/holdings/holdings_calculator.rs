//! Pure valuation math over replayed ledger states. No I/O here so the
//! numbers are easy to test in isolation.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use lotfolio_market_data::PriceQuote;

use crate::assets::Asset;
use crate::constants::QUANTITY_EPSILON;
use crate::holdings::holdings_model::{Holding, PortfolioSummary, PriceSource};
use crate::ledger::LedgerState;

/// Joins ledger states with asset metadata and resolved quotes into valued
/// holdings. Positions at or below the quantity epsilon are dropped.
///
/// Price precedence: resolved quote, then the asset's last transaction
/// price, then zero.
pub fn compute_holdings(
    states: &HashMap<String, LedgerState>,
    assets: &HashMap<String, Asset>,
    quotes: &HashMap<String, PriceQuote>,
) -> Vec<Holding> {
    let mut holdings: Vec<Holding> = states
        .iter()
        .filter(|(_, state)| state.total_quantity() > QUANTITY_EPSILON)
        .filter_map(|(asset_id, state)| {
            let asset = assets.get(asset_id)?;
            Some(build_holding(asset, state, quotes.get(&asset.symbol)))
        })
        .collect();
    holdings.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.symbol.cmp(&b.symbol)));
    holdings
}

fn build_holding(asset: &Asset, state: &LedgerState, quote: Option<&PriceQuote>) -> Holding {
    let quantity = state.total_quantity();
    let cost_basis = state.remaining_cost_basis();

    let (price, data_source) = match quote {
        Some(q) => (q.price, PriceSource::MarketData),
        None => (
            state.last_price.unwrap_or(Decimal::ZERO),
            PriceSource::LastTransaction,
        ),
    };

    let value = quantity * price;
    let unrealized_pl = value - cost_basis;
    let pl_percent = if cost_basis.is_zero() {
        Decimal::ZERO
    } else {
        unrealized_pl / cost_basis * dec!(100)
    };

    Holding {
        asset_id: asset.id.clone(),
        symbol: asset.symbol.clone(),
        name: asset.name.clone(),
        asset_class: asset.asset_class,
        market: asset.market.clone(),
        currency: asset.currency.clone(),
        total_quantity: quantity,
        avg_cost: state.average_cost(),
        price,
        value,
        unrealized_pl,
        pl_percent,
        realized_pl: state.realized_pl,
        oversold: state.oversold,
        data_source,
        provider_status: quote.map(|q| q.provider_status),
        is_stale: quote.map(|q| q.is_stale).unwrap_or(false),
        last_updated: quote.map(|q| q.last_updated),
    }
}

/// Totals across a set of holdings. An empty slice yields an all-zero
/// summary rather than an error.
pub fn compute_summary(holdings: &[Holding]) -> PortfolioSummary {
    let mut summary = PortfolioSummary::default();
    for holding in holdings {
        summary.net_worth += holding.value;
        summary.unrealized_pl += holding.unrealized_pl;
        summary.realized_pl += holding.realized_pl;
        summary.total_cost_basis += holding.total_quantity * holding.avg_cost;
    }
    summary.total_gain = summary.unrealized_pl + summary.realized_pl;
    summary
}
