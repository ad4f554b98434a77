//! Portfolio valuation service.
//!
//! Orchestrates the read path: replay transactions into ledger states, load
//! asset metadata, resolve one quote per unique symbol concurrently, and
//! hand everything to the pure calculator.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use lotfolio_market_data::PriceQuote;

use crate::assets::{Asset, AssetRepositoryTrait};
use crate::errors::{Error, Result};
use crate::holdings::holdings_calculator::{compute_holdings, compute_summary};
use crate::holdings::holdings_model::{AssetDetails, Holding, PortfolioSummary};
use crate::holdings::holdings_traits::QuoteResolverTrait;
use crate::ledger::{replay, replay_by_asset};
use crate::portfolios::PortfolioRepositoryTrait;
use crate::transactions::{NewTransaction, Transaction, TransactionRepositoryTrait};

pub struct HoldingsService {
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
    asset_repository: Arc<dyn AssetRepositoryTrait>,
    quote_resolver: Arc<dyn QuoteResolverTrait>,
}

impl HoldingsService {
    pub fn new(
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
        asset_repository: Arc<dyn AssetRepositoryTrait>,
        quote_resolver: Arc<dyn QuoteResolverTrait>,
    ) -> Self {
        Self {
            transaction_repository,
            portfolio_repository,
            asset_repository,
            quote_resolver,
        }
    }

    /// Valued holdings for a user, optionally scoped to one portfolio.
    pub async fn get_holdings(
        &self,
        user_id: &str,
        portfolio_id: Option<&str>,
    ) -> Result<Vec<Holding>> {
        if let Some(portfolio_id) = portfolio_id {
            // Ownership check; a miss surfaces as NotFound from the repo.
            self.portfolio_repository.get(user_id, portfolio_id).await?;
        }

        let transactions = self
            .transaction_repository
            .list_for_user(user_id, portfolio_id)
            .await?;
        let states = replay_by_asset(&transactions);

        let asset_ids: Vec<String> = states.keys().cloned().collect();
        let assets: HashMap<String, Asset> = self
            .asset_repository
            .list_by_ids(&asset_ids)
            .await?
            .into_iter()
            .map(|asset| (asset.id.clone(), asset))
            .collect();

        let quotes = self.resolve_quotes(assets.values()).await;

        debug!(
            "Computed holdings for user {}: {} open positions",
            user_id,
            states.len()
        );
        Ok(compute_holdings(&states, &assets, &quotes))
    }

    /// Portfolio totals. Errors with a typed NotFound when the portfolio
    /// does not exist or belongs to another user.
    pub async fn get_portfolio_summary(
        &self,
        user_id: &str,
        portfolio_id: &str,
    ) -> Result<PortfolioSummary> {
        self.portfolio_repository.get(user_id, portfolio_id).await?;
        let holdings = self.get_holdings(user_id, Some(portfolio_id)).await?;
        Ok(compute_summary(&holdings))
    }

    /// Drill-down for one asset: replayed position, its transactions, and
    /// return percentages.
    pub async fn get_asset_details(
        &self,
        user_id: &str,
        portfolio_id: &str,
        symbol: &str,
    ) -> Result<AssetDetails> {
        self.portfolio_repository.get(user_id, portfolio_id).await?;

        let asset = self
            .asset_repository
            .find_by_symbol(symbol, None)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Asset not found: {}", symbol)))?;

        let transactions = self
            .transaction_repository
            .list_for_asset(portfolio_id, &asset.id)
            .await?;
        if transactions.is_empty() {
            return Err(Error::NotFound(format!(
                "No transactions for {} in portfolio {}",
                symbol, portfolio_id
            )));
        }

        let state = replay(&transactions);
        let states = HashMap::from([(asset.id.clone(), state)]);
        let assets = HashMap::from([(asset.id.clone(), asset.clone())]);
        let quotes = self.resolve_quotes(assets.values()).await;

        let holding = compute_holdings(&states, &assets, &quotes)
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("Position already closed: {}", symbol)))?;

        let cost_basis = holding.total_quantity * holding.avg_cost;
        let total_return_percent = if cost_basis.is_zero() {
            Decimal::ZERO
        } else {
            (holding.unrealized_pl + holding.realized_pl) / cost_basis * dec!(100)
        };

        Ok(AssetDetails {
            holding,
            transactions,
            total_return_percent,
        })
    }

    /// Records a manual transaction after validating it against the
    /// portfolio.
    pub async fn add_transaction(
        &self,
        user_id: &str,
        portfolio_id: &str,
        new_transaction: NewTransaction,
    ) -> Result<Transaction> {
        if new_transaction.quantity <= Decimal::ZERO {
            return Err(Error::Validation(
                "Transaction quantity must be positive".to_string(),
            ));
        }
        if new_transaction.unit_price < Decimal::ZERO {
            return Err(Error::Validation(
                "Transaction price cannot be negative".to_string(),
            ));
        }
        if new_transaction.fee < Decimal::ZERO {
            return Err(Error::Validation(
                "Transaction fee cannot be negative".to_string(),
            ));
        }
        if new_transaction.portfolio_id != portfolio_id {
            return Err(Error::Validation(
                "Transaction portfolio does not match the request".to_string(),
            ));
        }

        self.portfolio_repository.get(user_id, portfolio_id).await?;
        self.asset_repository.get(&new_transaction.asset_id).await?;

        self.transaction_repository.insert(new_transaction).await
    }

    /// One concurrent quote lookup per unique symbol. Resolution failures
    /// produce a missing entry, not an error; the calculator falls back to
    /// the last transaction price.
    async fn resolve_quotes<'a, I>(&self, assets: I) -> HashMap<String, PriceQuote>
    where
        I: Iterator<Item = &'a Asset>,
    {
        let mut seen = HashSet::new();
        let unique: Vec<&Asset> = assets
            .filter(|asset| seen.insert(asset.symbol.clone()))
            .collect();

        let lookups = unique.iter().map(|asset| {
            let resolver = Arc::clone(&self.quote_resolver);
            async move {
                resolver
                    .resolve_quote(&asset.symbol, asset.asset_class, asset.market.as_deref())
                    .await
                    .map(|quote| (asset.symbol.clone(), quote))
            }
        });

        join_all(lookups).await.into_iter().flatten().collect()
    }
}
