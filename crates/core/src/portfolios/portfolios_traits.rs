use async_trait::async_trait;

use super::portfolios_model::Portfolio;
use crate::errors::Result;

/// Storage access for portfolios. Lookups are scoped to the owning user so a
/// caller can never read another user's portfolio by guessing ids.
#[async_trait]
pub trait PortfolioRepositoryTrait: Send + Sync {
    async fn get(&self, user_id: &str, portfolio_id: &str) -> Result<Portfolio>;

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Portfolio>>;
}
