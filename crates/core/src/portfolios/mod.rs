pub mod portfolios_model;
pub mod portfolios_traits;

pub use portfolios_model::Portfolio;
pub use portfolios_traits::PortfolioRepositoryTrait;
