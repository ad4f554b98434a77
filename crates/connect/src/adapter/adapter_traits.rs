use async_trait::async_trait;

use lotfolio_core::ExchangeCredentials;

use super::adapter_model::{AdapterError, CredentialValidation, ExchangeBalance};

/// One implementation per supported exchange. Adapters are stateless beyond
/// their HTTP client; credentials arrive per call.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    /// Stable identifier matching `Connection::exchange_id`, e.g. "binance".
    fn exchange_id(&self) -> &'static str;

    /// Real round trip against an authenticated endpoint. Credential
    /// rejection comes back as a `CredentialValidation`, not an error;
    /// transport trouble is still an `Err`.
    async fn validate_credentials(
        &self,
        credentials: &ExchangeCredentials,
    ) -> Result<CredentialValidation, AdapterError>;

    /// Current spot balances, USD valued, with zero and dust positions
    /// already filtered out.
    async fn fetch_balances(
        &self,
        credentials: &ExchangeCredentials,
    ) -> Result<Vec<ExchangeBalance>, AdapterError>;
}
