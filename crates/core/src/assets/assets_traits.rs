use async_trait::async_trait;

use lotfolio_market_data::AssetKind;

use super::assets_model::{Asset, NewAsset};
use crate::errors::Result;

/// Storage access for assets.
#[async_trait]
pub trait AssetRepositoryTrait: Send + Sync {
    async fn get(&self, asset_id: &str) -> Result<Asset>;

    async fn list_by_ids(&self, asset_ids: &[String]) -> Result<Vec<Asset>>;

    /// Case-insensitive symbol lookup; `asset_class` narrows the match when
    /// the same symbol exists as both an equity and a crypto asset.
    async fn find_by_symbol(
        &self,
        symbol: &str,
        asset_class: Option<AssetKind>,
    ) -> Result<Option<Asset>>;

    /// Inserts the asset if the (symbol, class) pair is unknown, otherwise
    /// returns the existing record.
    async fn upsert(&self, new_asset: NewAsset) -> Result<Asset>;
}
