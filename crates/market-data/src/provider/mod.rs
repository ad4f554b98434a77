//! Quote provider implementations.

pub mod coingecko;
mod traits;
pub mod yahoo;

pub use traits::QuoteProvider;
