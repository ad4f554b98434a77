//! Lotfolio Core - Domain entities, services, and traits.
//!
//! This crate contains the core business logic for portfolio tracking:
//! the FIFO lot ledger, the valuation engine, and the narrow repository
//! traits the storage layer implements. It is database-agnostic.

pub mod assets;
pub mod connections;
pub mod constants;
pub mod errors;
pub mod holdings;
pub mod ledger;
pub mod portfolios;
pub mod transactions;

// Re-export common types
pub use assets::{Asset, NewAsset};
pub use connections::{Connection, ConnectionStatus, ExchangeCredentials};
pub use holdings::{AssetDetails, Holding, HoldingsService, PortfolioSummary, PriceSource};
pub use ledger::{LedgerState, Lot};
pub use portfolios::Portfolio;
pub use transactions::{NewTransaction, Transaction, TransactionType};

// Re-export error types
pub use errors::Error;
pub use errors::Result;

// Re-export the asset kind from the market data crate so downstream users
// only need one import path.
pub use lotfolio_market_data::AssetKind;
