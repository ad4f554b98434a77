pub mod sync_model;
pub mod sync_scheduler;
pub mod sync_service;

pub use sync_model::{SyncConfig, SyncResult, SyncSummary, SyncedBalance};
pub use sync_scheduler::{SyncRunner, SyncScheduler};
pub use sync_service::SyncOrchestrator;

#[cfg(test)]
mod sync_tests;
