//! Sync configuration and result types.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tuning knobs for the sync pipeline.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Maximum number of connections synced at the same time.
    pub concurrency_limit: usize,
    /// Balances below this USD value are dropped even if an adapter let
    /// them through.
    pub dust_threshold_usd: Decimal,
    /// Scheduler tick interval.
    pub interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 5,
            dust_threshold_usd: Decimal::ONE,
            interval: Duration::from_secs(60),
        }
    }
}

/// One balance recorded during a sync run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncedBalance {
    pub asset: String,
    pub quantity: Decimal,
    pub usd_value: Decimal,
}

/// Outcome of syncing one connection. Failures are data, not errors; the
/// orchestrator never lets one bad connection abort a sweep.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub connection_id: String,
    pub success: bool,
    pub assets_synced: usize,
    pub synced_balances: Vec<SyncedBalance>,
    pub error: Option<String>,
}

impl SyncResult {
    pub fn succeeded(connection_id: &str, synced_balances: Vec<SyncedBalance>) -> Self {
        Self {
            connection_id: connection_id.to_string(),
            success: true,
            assets_synced: synced_balances.len(),
            synced_balances,
            error: None,
        }
    }

    pub fn failed(connection_id: &str, error: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.to_string(),
            success: false,
            assets_synced: 0,
            synced_balances: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Aggregate over one full sweep of active connections.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl SyncSummary {
    pub fn from_results(results: &[SyncResult]) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
        }
    }
}
