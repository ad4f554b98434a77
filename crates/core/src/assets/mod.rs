pub mod assets_model;
pub mod assets_traits;

pub use assets_model::{Asset, NewAsset};
pub use assets_traits::AssetRepositoryTrait;
