//! Balance sync orchestration.
//!
//! Pulls spot balances from each connected exchange and restates them in
//! the ledger as SYNC transactions, one per asset, carrying the reported
//! quantity and an implied unit price of `usd_value / quantity`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use rust_decimal::Decimal;
use log::{error, info, warn};
use tokio::sync::Semaphore;

use lotfolio_core::assets::AssetRepositoryTrait;
use lotfolio_core::connections::{
    Connection, ConnectionRepositoryTrait, CredentialResolverTrait,
};
use lotfolio_core::constants::PRICE_SCALE;
use lotfolio_core::errors::Result;
use lotfolio_core::transactions::TransactionRepositoryTrait;
use lotfolio_core::{NewAsset, NewTransaction, TransactionType};

use crate::adapter::{ExchangeAdapter, ExchangeBalance};

use super::sync_model::{SyncConfig, SyncResult, SyncSummary, SyncedBalance};

pub struct SyncOrchestrator {
    connection_repository: Arc<dyn ConnectionRepositoryTrait>,
    credential_resolver: Arc<dyn CredentialResolverTrait>,
    asset_repository: Arc<dyn AssetRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    adapters: HashMap<String, Arc<dyn ExchangeAdapter>>,
    config: SyncConfig,
}

impl SyncOrchestrator {
    pub fn new(
        connection_repository: Arc<dyn ConnectionRepositoryTrait>,
        credential_resolver: Arc<dyn CredentialResolverTrait>,
        asset_repository: Arc<dyn AssetRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        adapters: Vec<Arc<dyn ExchangeAdapter>>,
        config: SyncConfig,
    ) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|a| (a.exchange_id().to_string(), a))
            .collect();
        Self {
            connection_repository,
            credential_resolver,
            asset_repository,
            transaction_repository,
            adapters,
            config,
        }
    }

    /// Syncs one connection on behalf of a user. An unknown or foreign
    /// connection id surfaces as a typed error; everything past the lookup
    /// is captured into the returned [`SyncResult`].
    pub async fn sync_connection(&self, user_id: &str, connection_id: &str) -> Result<SyncResult> {
        let connection = self.connection_repository.get(user_id, connection_id).await?;
        Ok(self.sync_resolved(&connection).await)
    }

    /// Sweeps all active connections, at most `concurrency_limit` at a
    /// time. One connection failing never stops the others.
    pub async fn sync_all_active(&self) -> Result<SyncSummary> {
        let connections = self.connection_repository.list_active().await?;
        info!("Starting balance sync for {} connections", connections.len());

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency_limit));
        let tasks = connections.iter().map(|connection| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                // Closed only on semaphore.close(), which we never call.
                let _permit = semaphore.acquire().await;
                self.sync_resolved(connection).await
            }
        });

        let results = join_all(tasks).await;
        for result in results.iter().filter(|r| !r.success) {
            warn!(
                "Sync failed for connection {}: {}",
                result.connection_id,
                result.error.as_deref().unwrap_or("unknown")
            );
        }

        let summary = SyncSummary::from_results(&results);
        info!(
            "Balance sync finished: {}/{} connections succeeded",
            summary.succeeded, summary.total
        );
        Ok(summary)
    }

    async fn sync_resolved(&self, connection: &Connection) -> SyncResult {
        let Some(adapter) = self.adapters.get(&connection.exchange_id) else {
            return SyncResult::failed(
                &connection.id,
                format!("No adapter registered for exchange {}", connection.exchange_id),
            );
        };

        let credentials = match self
            .credential_resolver
            .resolve(&connection.credential_ref)
            .await
        {
            Ok(credentials) => credentials,
            Err(err) => return SyncResult::failed(&connection.id, err.to_string()),
        };

        let balances = match adapter.fetch_balances(&credentials).await {
            Ok(balances) => balances,
            Err(err) => return SyncResult::failed(&connection.id, err.to_string()),
        };

        let mut synced = Vec::new();
        for balance in balances {
            if balance.usd_value < self.config.dust_threshold_usd {
                continue;
            }
            if balance.total.is_zero() {
                warn!(
                    "Skipping {} balance on connection {}: zero quantity with usd value {}",
                    balance.asset, connection.id, balance.usd_value
                );
                continue;
            }
            match self.record_balance(connection, &balance).await {
                Ok(recorded) => synced.push(recorded),
                Err(err) => return SyncResult::failed(&connection.id, err.to_string()),
            }
        }

        if let Err(err) = self
            .connection_repository
            .update_last_synced(&connection.id, Utc::now())
            .await
        {
            error!(
                "Failed to stamp last_synced_at for connection {}: {}",
                connection.id, err
            );
        }

        SyncResult::succeeded(&connection.id, synced)
    }

    /// Upserts the asset and writes one SYNC transaction restating the
    /// full exchange balance.
    async fn record_balance(
        &self,
        connection: &Connection,
        balance: &ExchangeBalance,
    ) -> Result<SyncedBalance> {
        let asset = self
            .asset_repository
            .upsert(NewAsset::synced_crypto(
                &balance.asset,
                &connection.exchange_id,
            ))
            .await?;

        let unit_price = (balance.usd_value / balance.total).round_dp(PRICE_SCALE);
        self.transaction_repository
            .insert(NewTransaction {
                id: None,
                portfolio_id: connection.portfolio_id.clone(),
                asset_id: asset.id,
                kind: TransactionType::Sync,
                quantity: balance.total,
                unit_price,
                fee: Decimal::ZERO,
                exchange_rate: None,
                transaction_date: None,
                notes: Some(format!("Synced from {}", connection.exchange_id)),
            })
            .await?;

        Ok(SyncedBalance {
            asset: balance.asset.clone(),
            quantity: balance.total,
            usd_value: balance.usd_value,
        })
    }
}
