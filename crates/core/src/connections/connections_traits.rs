use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::connections_model::{Connection, ExchangeCredentials};
use crate::errors::Result;

/// Storage access for exchange connections.
#[async_trait]
pub trait ConnectionRepositoryTrait: Send + Sync {
    /// Scoped to the owning user, like portfolio lookups.
    async fn get(&self, user_id: &str, connection_id: &str) -> Result<Connection>;

    /// Connections eligible for a scheduled sync pass.
    async fn list_active(&self) -> Result<Vec<Connection>>;

    async fn update_last_synced(
        &self,
        connection_id: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<()>;
}

/// Resolves a connection's opaque credential handle into usable API keys.
#[async_trait]
pub trait CredentialResolverTrait: Send + Sync {
    async fn resolve(&self, credential_ref: &str) -> Result<ExchangeCredentials>;
}
