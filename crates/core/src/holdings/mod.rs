pub mod holdings_calculator;
pub mod holdings_model;
pub mod holdings_service;
pub mod holdings_traits;

pub use holdings_calculator::{compute_holdings, compute_summary};
pub use holdings_model::{AssetDetails, Holding, PortfolioSummary, PriceSource};
pub use holdings_service::HoldingsService;
pub use holdings_traits::QuoteResolverTrait;

#[cfg(test)]
mod holdings_service_tests;
