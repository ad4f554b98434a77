//! Repository contract for transactions.

use async_trait::async_trait;

use super::transactions_model::{NewTransaction, Transaction};
use crate::errors::Result;

/// Narrow persistence interface for the transaction stream.
///
/// The core has zero knowledge of the underlying store; implementations
/// live in the storage layer (or in test mocks).
#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    /// All transactions visible to a user, optionally scoped to one
    /// portfolio. Order is unspecified; the ledger sorts before replay.
    async fn list_for_user(
        &self,
        user_id: &str,
        portfolio_id: Option<&str>,
    ) -> Result<Vec<Transaction>>;

    /// Transactions for a single asset within a portfolio.
    async fn list_for_asset(&self, portfolio_id: &str, asset_id: &str)
        -> Result<Vec<Transaction>>;

    /// Append one immutable transaction row.
    async fn insert(&self, new: NewTransaction) -> Result<Transaction>;
}
