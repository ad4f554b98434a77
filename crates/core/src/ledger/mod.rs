pub mod ledger_calculator;
pub mod ledger_model;

pub use ledger_calculator::{replay, replay_by_asset, LedgerCalculator};
pub use ledger_model::{LedgerState, Lot};
