use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::watch;

use lotfolio_core::assets::{Asset, AssetRepositoryTrait, NewAsset};
use lotfolio_core::connections::{
    Connection, ConnectionRepositoryTrait, ConnectionStatus, CredentialResolverTrait,
    ExchangeCredentials,
};
use lotfolio_core::errors::{Error, Result};
use lotfolio_core::transactions::{
    NewTransaction, Transaction, TransactionRepositoryTrait, TransactionType,
};
use lotfolio_core::AssetKind;

use crate::adapter::{AdapterError, CredentialValidation, ExchangeAdapter, ExchangeBalance};

use super::sync_model::{SyncConfig, SyncSummary};
use super::sync_scheduler::{SyncRunner, SyncScheduler};
use super::sync_service::SyncOrchestrator;

struct MockConnectionRepository {
    connections: Vec<Connection>,
    stamped: Mutex<Vec<String>>,
}

#[async_trait]
impl ConnectionRepositoryTrait for MockConnectionRepository {
    async fn get(&self, user_id: &str, connection_id: &str) -> Result<Connection> {
        self.connections
            .iter()
            .find(|c| c.user_id == user_id && c.id == connection_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Connection not found: {}", connection_id)))
    }

    async fn list_active(&self) -> Result<Vec<Connection>> {
        Ok(self
            .connections
            .iter()
            .filter(|c| c.status == ConnectionStatus::Active)
            .cloned()
            .collect())
    }

    async fn update_last_synced(
        &self,
        connection_id: &str,
        _synced_at: DateTime<Utc>,
    ) -> Result<()> {
        self.stamped.lock().unwrap().push(connection_id.to_string());
        Ok(())
    }
}

struct MockCredentialResolver;

#[async_trait]
impl CredentialResolverTrait for MockCredentialResolver {
    async fn resolve(&self, _credential_ref: &str) -> Result<ExchangeCredentials> {
        Ok(ExchangeCredentials {
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
        })
    }
}

struct MockAssetRepository;

#[async_trait]
impl AssetRepositoryTrait for MockAssetRepository {
    async fn get(&self, asset_id: &str) -> Result<Asset> {
        Err(Error::NotFound(asset_id.to_string()))
    }

    async fn list_by_ids(&self, _asset_ids: &[String]) -> Result<Vec<Asset>> {
        Ok(Vec::new())
    }

    async fn find_by_symbol(
        &self,
        _symbol: &str,
        _asset_class: Option<AssetKind>,
    ) -> Result<Option<Asset>> {
        Ok(None)
    }

    async fn upsert(&self, new_asset: NewAsset) -> Result<Asset> {
        // Deterministic id so tests can assert on inserted transactions.
        Ok(Asset {
            id: format!("asset-{}", new_asset.symbol),
            symbol: new_asset.symbol,
            name: new_asset.name,
            asset_class: new_asset.asset_class,
            market: new_asset.market,
            currency: new_asset.currency,
            source: new_asset.source,
        })
    }
}

struct MockTransactionRepository {
    inserted: Mutex<Vec<Transaction>>,
}

#[async_trait]
impl TransactionRepositoryTrait for MockTransactionRepository {
    async fn list_for_user(
        &self,
        _user_id: &str,
        _portfolio_id: Option<&str>,
    ) -> Result<Vec<Transaction>> {
        Ok(Vec::new())
    }

    async fn list_for_asset(
        &self,
        _portfolio_id: &str,
        _asset_id: &str,
    ) -> Result<Vec<Transaction>> {
        Ok(Vec::new())
    }

    async fn insert(&self, new: NewTransaction) -> Result<Transaction> {
        let tx = new.into_transaction();
        self.inserted.lock().unwrap().push(tx.clone());
        Ok(tx)
    }
}

struct MockAdapter {
    id: &'static str,
    balances: std::result::Result<Vec<ExchangeBalance>, AdapterError>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockAdapter {
    fn new(id: &'static str, balances: Vec<ExchangeBalance>) -> Self {
        Self {
            id,
            balances: Ok(balances),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn failing(id: &'static str, error: AdapterError) -> Self {
        Self {
            id,
            balances: Err(error),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ExchangeAdapter for MockAdapter {
    fn exchange_id(&self) -> &'static str {
        self.id
    }

    async fn validate_credentials(
        &self,
        _credentials: &ExchangeCredentials,
    ) -> std::result::Result<CredentialValidation, AdapterError> {
        Ok(CredentialValidation::ok())
    }

    async fn fetch_balances(
        &self,
        _credentials: &ExchangeCredentials,
    ) -> std::result::Result<Vec<ExchangeBalance>, AdapterError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.balances.clone()
    }
}

fn connection(id: &str, exchange_id: &str) -> Connection {
    Connection {
        id: id.to_string(),
        user_id: "u1".to_string(),
        portfolio_id: "p1".to_string(),
        exchange_id: exchange_id.to_string(),
        status: ConnectionStatus::Active,
        credential_ref: format!("cred-{}", id),
        last_synced_at: None,
    }
}

fn balance(asset: &str, total: Decimal, usd_value: Decimal) -> ExchangeBalance {
    ExchangeBalance {
        asset: asset.to_string(),
        free: total,
        locked: Decimal::ZERO,
        total,
        usd_value,
    }
}

struct Fixture {
    orchestrator: SyncOrchestrator,
    connections: Arc<MockConnectionRepository>,
    transactions: Arc<MockTransactionRepository>,
}

fn fixture(connections: Vec<Connection>, adapters: Vec<Arc<dyn ExchangeAdapter>>) -> Fixture {
    let connection_repo = Arc::new(MockConnectionRepository {
        connections,
        stamped: Mutex::new(Vec::new()),
    });
    let transaction_repo = Arc::new(MockTransactionRepository {
        inserted: Mutex::new(Vec::new()),
    });
    let orchestrator = SyncOrchestrator::new(
        connection_repo.clone(),
        Arc::new(MockCredentialResolver),
        Arc::new(MockAssetRepository),
        transaction_repo.clone(),
        adapters,
        SyncConfig::default(),
    );
    Fixture {
        orchestrator,
        connections: connection_repo,
        transactions: transaction_repo,
    }
}

#[tokio::test]
async fn test_sync_writes_one_sync_transaction_per_balance() {
    let adapter = Arc::new(MockAdapter::new(
        "binance",
        vec![
            balance("BTC", dec!(0.5), dec!(25000)),
            balance("USDT", dec!(100), dec!(100)),
        ],
    ));
    let f = fixture(vec![connection("c1", "binance")], vec![adapter]);

    let result = f.orchestrator.sync_connection("u1", "c1").await.unwrap();
    assert!(result.success);
    assert_eq!(result.assets_synced, 2);

    let inserted = f.transactions.inserted.lock().unwrap();
    assert_eq!(inserted.len(), 2);
    assert!(inserted.iter().all(|tx| tx.kind == TransactionType::Sync));

    let btc = inserted
        .iter()
        .find(|tx| tx.asset_id == "asset-BTC")
        .unwrap();
    assert_eq!(btc.quantity, dec!(0.5));
    assert_eq!(btc.unit_price, dec!(50000));

    assert_eq!(*f.connections.stamped.lock().unwrap(), vec!["c1"]);
}

#[tokio::test]
async fn test_unknown_connection_is_not_found() {
    let f = fixture(vec![], vec![]);
    let err = f.orchestrator.sync_connection("u1", "nope").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_adapter_failure_is_captured_not_propagated() {
    let adapter = Arc::new(MockAdapter::failing(
        "binance",
        AdapterError::RateLimited("slow down".to_string()),
    ));
    let f = fixture(vec![connection("c1", "binance")], vec![adapter]);

    let result = f.orchestrator.sync_connection("u1", "c1").await.unwrap();
    assert!(!result.success);
    assert!(result.error.as_deref().unwrap().contains("slow down"));
    assert!(f.transactions.inserted.lock().unwrap().is_empty());
    assert!(f.connections.stamped.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_adapter_is_captured() {
    let f = fixture(vec![connection("c1", "kraken")], vec![]);
    let result = f.orchestrator.sync_connection("u1", "c1").await.unwrap();
    assert!(!result.success);
    assert!(result.error.as_deref().unwrap().contains("kraken"));
}

#[tokio::test]
async fn test_orchestrator_drops_dust_balances() {
    let adapter = Arc::new(MockAdapter::new(
        "binance",
        vec![
            balance("BTC", dec!(1), dec!(50000)),
            balance("SHIB", dec!(10), dec!(0.5)),
        ],
    ));
    let f = fixture(vec![connection("c1", "binance")], vec![adapter]);

    let result = f.orchestrator.sync_connection("u1", "c1").await.unwrap();
    assert_eq!(result.assets_synced, 1);
    assert_eq!(result.synced_balances[0].asset, "BTC");
}

#[tokio::test]
async fn test_zero_quantity_balance_is_skipped_not_divided() {
    // A misbehaving adapter can report value with no quantity; the implied
    // unit price would divide by zero, so the balance must be skipped.
    let adapter = Arc::new(MockAdapter::new(
        "binance",
        vec![
            balance("GHOST", Decimal::ZERO, dec!(5)),
            balance("BTC", dec!(1), dec!(50000)),
        ],
    ));
    let f = fixture(vec![connection("c1", "binance")], vec![adapter]);

    let result = f.orchestrator.sync_connection("u1", "c1").await.unwrap();
    assert!(result.success);
    assert_eq!(result.assets_synced, 1);
    assert_eq!(result.synced_balances[0].asset, "BTC");
    assert_eq!(f.transactions.inserted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_sweep_respects_concurrency_limit() {
    let adapter = Arc::new(MockAdapter::new(
        "binance",
        vec![balance("BTC", dec!(1), dec!(50000))],
    ));
    let connections = (0..10)
        .map(|i| connection(&format!("c{}", i), "binance"))
        .collect();
    let f = fixture(connections, vec![adapter.clone()]);

    let summary = f.orchestrator.sync_all_active().await.unwrap();
    assert_eq!(summary.succeeded, 10);
    assert!(adapter.max_in_flight.load(Ordering::SeqCst) <= 5);
}

#[tokio::test]
async fn test_one_failing_connection_does_not_stop_the_sweep() {
    let good = Arc::new(MockAdapter::new(
        "binance",
        vec![balance("BTC", dec!(1), dec!(50000))],
    ));
    let bad = Arc::new(MockAdapter::failing(
        "kraken",
        AdapterError::ExchangeUnavailable("maintenance".to_string()),
    ));
    let f = fixture(
        vec![
            connection("c1", "binance"),
            connection("c2", "kraken"),
            connection("c3", "binance"),
        ],
        vec![good, bad],
    );

    let summary = f.orchestrator.sync_all_active().await.unwrap();
    assert_eq!(
        summary,
        SyncSummary {
            total: 3,
            succeeded: 2,
            failed: 1
        }
    );
}

#[tokio::test]
async fn test_disabled_connections_are_not_swept() {
    let adapter = Arc::new(MockAdapter::new("binance", vec![]));
    let mut disabled = connection("c1", "binance");
    disabled.status = ConnectionStatus::Disabled;
    let f = fixture(vec![disabled, connection("c2", "binance")], vec![adapter]);

    let summary = f.orchestrator.sync_all_active().await.unwrap();
    assert_eq!(summary.total, 1);
}

struct CountingRunner {
    runs: AtomicUsize,
    work: Duration,
}

#[async_trait]
impl SyncRunner for CountingRunner {
    async fn run_once(&self) {
        self.runs.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.work).await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_stops_on_shutdown() {
    let runner = Arc::new(CountingRunner {
        runs: AtomicUsize::new(0),
        work: Duration::ZERO,
    });
    let config = SyncConfig {
        interval: Duration::from_millis(100),
        ..SyncConfig::default()
    };
    let scheduler = SyncScheduler::new(runner.clone(), &config);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(async move { scheduler.run(shutdown_rx).await });
    tokio::time::sleep(Duration::from_millis(250)).await;
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();

    assert!(runner.runs.load(Ordering::SeqCst) >= 2);
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_skips_ticks_while_a_sweep_is_draining() {
    // Each sweep outlasts two tick periods; missed ticks must be skipped,
    // not queued, so the run count stays well below the tick count.
    let runner = Arc::new(CountingRunner {
        runs: AtomicUsize::new(0),
        work: Duration::from_millis(250),
    });
    let config = SyncConfig {
        interval: Duration::from_millis(100),
        ..SyncConfig::default()
    };
    let scheduler = SyncScheduler::new(runner.clone(), &config);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(async move { scheduler.run(shutdown_rx).await });
    tokio::time::sleep(Duration::from_millis(500)).await;
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();

    // Ten ticks worth of time but each run blocks the loop for 2.5 ticks.
    assert!(runner.runs.load(Ordering::SeqCst) <= 2);
}
