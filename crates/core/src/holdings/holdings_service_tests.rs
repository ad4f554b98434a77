use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use lotfolio_market_data::{AssetKind, PriceQuote, ProviderStatus};

use crate::assets::{Asset, AssetRepositoryTrait, NewAsset};
use crate::errors::{Error, Result};
use crate::holdings::holdings_model::PriceSource;
use crate::holdings::holdings_service::HoldingsService;
use crate::holdings::holdings_traits::QuoteResolverTrait;
use crate::portfolios::{Portfolio, PortfolioRepositoryTrait};
use crate::transactions::{
    NewTransaction, Transaction, TransactionRepositoryTrait, TransactionType,
};

struct MockTransactionRepository {
    transactions: Vec<Transaction>,
    inserted: Mutex<Vec<Transaction>>,
}

impl MockTransactionRepository {
    fn new(transactions: Vec<Transaction>) -> Self {
        Self {
            transactions,
            inserted: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TransactionRepositoryTrait for MockTransactionRepository {
    async fn list_for_user(
        &self,
        _user_id: &str,
        portfolio_id: Option<&str>,
    ) -> Result<Vec<Transaction>> {
        Ok(self
            .transactions
            .iter()
            .filter(|tx| portfolio_id.map_or(true, |p| tx.portfolio_id == p))
            .cloned()
            .collect())
    }

    async fn list_for_asset(
        &self,
        portfolio_id: &str,
        asset_id: &str,
    ) -> Result<Vec<Transaction>> {
        Ok(self
            .transactions
            .iter()
            .filter(|tx| tx.portfolio_id == portfolio_id && tx.asset_id == asset_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, new: NewTransaction) -> Result<Transaction> {
        let tx = new.into_transaction();
        self.inserted.lock().unwrap().push(tx.clone());
        Ok(tx)
    }
}

struct MockPortfolioRepository {
    portfolios: Vec<Portfolio>,
}

#[async_trait]
impl PortfolioRepositoryTrait for MockPortfolioRepository {
    async fn get(&self, user_id: &str, portfolio_id: &str) -> Result<Portfolio> {
        self.portfolios
            .iter()
            .find(|p| p.user_id == user_id && p.id == portfolio_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Portfolio not found: {}", portfolio_id)))
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Portfolio>> {
        Ok(self
            .portfolios
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }
}

struct MockAssetRepository {
    assets: Vec<Asset>,
}

#[async_trait]
impl AssetRepositoryTrait for MockAssetRepository {
    async fn get(&self, asset_id: &str) -> Result<Asset> {
        self.assets
            .iter()
            .find(|a| a.id == asset_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Asset not found: {}", asset_id)))
    }

    async fn list_by_ids(&self, asset_ids: &[String]) -> Result<Vec<Asset>> {
        Ok(self
            .assets
            .iter()
            .filter(|a| asset_ids.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn find_by_symbol(
        &self,
        symbol: &str,
        asset_class: Option<AssetKind>,
    ) -> Result<Option<Asset>> {
        Ok(self
            .assets
            .iter()
            .find(|a| {
                a.symbol.eq_ignore_ascii_case(symbol)
                    && asset_class.map_or(true, |k| a.asset_class == k)
            })
            .cloned())
    }

    async fn upsert(&self, new_asset: NewAsset) -> Result<Asset> {
        Ok(new_asset.into_asset())
    }
}

struct MockQuoteResolver {
    quotes: HashMap<String, PriceQuote>,
    calls: AtomicUsize,
}

impl MockQuoteResolver {
    fn new(quotes: HashMap<String, PriceQuote>) -> Self {
        Self {
            quotes,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl QuoteResolverTrait for MockQuoteResolver {
    async fn resolve_quote(
        &self,
        symbol: &str,
        _asset_class: AssetKind,
        _market: Option<&str>,
    ) -> Option<PriceQuote> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.quotes.get(symbol).cloned()
    }
}

fn portfolio(id: &str, user_id: &str) -> Portfolio {
    Portfolio {
        id: id.to_string(),
        user_id: user_id.to_string(),
        name: "Main".to_string(),
        base_currency: "USD".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

fn asset(id: &str, symbol: &str) -> Asset {
    Asset {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: symbol.to_string(),
        asset_class: AssetKind::Crypto,
        market: None,
        currency: "USD".to_string(),
        source: None,
    }
}

fn buy(id: &str, asset_id: &str, quantity: Decimal, price: Decimal, day: u32) -> Transaction {
    Transaction {
        id: id.to_string(),
        portfolio_id: "p1".to_string(),
        asset_id: asset_id.to_string(),
        kind: TransactionType::Buy,
        quantity,
        unit_price: price,
        fee: Decimal::ZERO,
        exchange_rate: Decimal::ONE,
        transaction_date: Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
        notes: None,
    }
}

fn quote(symbol: &str, price: Decimal) -> PriceQuote {
    PriceQuote {
        symbol: symbol.to_string(),
        price,
        change24h: None,
        change_percent24h: None,
        previous_close: None,
        provider: "test".to_string(),
        provider_status: ProviderStatus::Live,
        is_stale: false,
        last_updated: Utc::now(),
    }
}

struct Fixture {
    service: HoldingsService,
    transactions: Arc<MockTransactionRepository>,
    resolver: Arc<MockQuoteResolver>,
}

fn fixture(
    transactions: Vec<Transaction>,
    assets: Vec<Asset>,
    quotes: HashMap<String, PriceQuote>,
) -> Fixture {
    let transaction_repo = Arc::new(MockTransactionRepository::new(transactions));
    let resolver = Arc::new(MockQuoteResolver::new(quotes));
    let service = HoldingsService::new(
        transaction_repo.clone(),
        Arc::new(MockPortfolioRepository {
            portfolios: vec![portfolio("p1", "u1")],
        }),
        Arc::new(MockAssetRepository { assets }),
        resolver.clone(),
    );
    Fixture {
        service,
        transactions: transaction_repo,
        resolver,
    }
}

#[tokio::test]
async fn test_get_holdings_values_open_positions() {
    let f = fixture(
        vec![buy("t1", "a1", dec!(10), dec!(100), 1)],
        vec![asset("a1", "BTC")],
        HashMap::from([("BTC".to_string(), quote("BTC", dec!(120)))]),
    );

    let holdings = f.service.get_holdings("u1", Some("p1")).await.unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].value, dec!(1200));
    assert_eq!(holdings[0].data_source, PriceSource::MarketData);
}

#[tokio::test]
async fn test_get_holdings_unknown_portfolio_is_not_found() {
    let f = fixture(vec![], vec![], HashMap::new());
    let err = f.service.get_holdings("u1", Some("nope")).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_one_quote_lookup_per_unique_symbol() {
    let f = fixture(
        vec![
            buy("t1", "a1", dec!(1), dec!(100), 1),
            buy("t2", "a1", dec!(2), dec!(110), 2),
            buy("t3", "a2", dec!(5), dec!(20), 3),
        ],
        vec![asset("a1", "BTC"), asset("a2", "ETH")],
        HashMap::new(),
    );

    f.service.get_holdings("u1", Some("p1")).await.unwrap();
    assert_eq!(f.resolver.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_summary_for_missing_portfolio_is_not_found() {
    let f = fixture(vec![], vec![], HashMap::new());
    let err = f
        .service
        .get_portfolio_summary("u1", "missing")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_summary_over_no_transactions_is_zero() {
    let f = fixture(vec![], vec![], HashMap::new());
    let summary = f.service.get_portfolio_summary("u1", "p1").await.unwrap();
    assert_eq!(summary.net_worth, Decimal::ZERO);
    assert_eq!(summary.total_gain, Decimal::ZERO);
}

#[tokio::test]
async fn test_asset_details_without_transactions_is_not_found() {
    let f = fixture(vec![], vec![asset("a1", "BTC")], HashMap::new());
    let err = f
        .service
        .get_asset_details("u1", "p1", "BTC")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_asset_details_computes_total_return() {
    let f = fixture(
        vec![buy("t1", "a1", dec!(10), dec!(100), 1)],
        vec![asset("a1", "BTC")],
        HashMap::from([("BTC".to_string(), quote("BTC", dec!(150)))]),
    );

    let details = f.service.get_asset_details("u1", "p1", "BTC").await.unwrap();
    assert_eq!(details.transactions.len(), 1);
    assert_eq!(details.holding.unrealized_pl, dec!(500));
    assert_eq!(details.total_return_percent, dec!(50));
}

#[tokio::test]
async fn test_add_transaction_rejects_non_positive_quantity() {
    let f = fixture(vec![], vec![asset("a1", "BTC")], HashMap::new());
    let new = NewTransaction {
        id: None,
        portfolio_id: "p1".to_string(),
        asset_id: "a1".to_string(),
        kind: TransactionType::Buy,
        quantity: Decimal::ZERO,
        unit_price: dec!(100),
        fee: Decimal::ZERO,
        exchange_rate: None,
        transaction_date: None,
        notes: None,
    };

    let err = f.service.add_transaction("u1", "p1", new).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(f.transactions.inserted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_add_transaction_inserts_valid_input() {
    let f = fixture(vec![], vec![asset("a1", "BTC")], HashMap::new());
    let new = NewTransaction {
        id: None,
        portfolio_id: "p1".to_string(),
        asset_id: "a1".to_string(),
        kind: TransactionType::Buy,
        quantity: dec!(2),
        unit_price: dec!(100),
        fee: dec!(1),
        exchange_rate: None,
        transaction_date: None,
        notes: None,
    };

    let tx = f.service.add_transaction("u1", "p1", new).await.unwrap();
    assert_eq!(tx.quantity, dec!(2));
    assert_eq!(f.transactions.inserted.lock().unwrap().len(), 1);
}
