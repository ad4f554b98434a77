//! Lotfolio Connect - Exchange connectivity and balance synchronization.
//!
//! Adapters turn exchange REST APIs into a uniform balance feed; the sync
//! orchestrator pulls those balances on a schedule and records them as
//! SYNC transactions in the core ledger.

pub mod adapter;
pub mod sync;

pub use adapter::{
    AdapterError, BinanceAdapter, CredentialValidation, ExchangeAdapter, ExchangeBalance,
};
pub use sync::{
    SyncConfig, SyncOrchestrator, SyncResult, SyncRunner, SyncScheduler, SyncSummary,
    SyncedBalance,
};
