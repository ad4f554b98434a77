pub mod adapter_model;
pub mod adapter_traits;
pub mod binance;

pub use adapter_model::{AdapterError, CredentialValidation, ExchangeBalance};
pub use adapter_traits::ExchangeAdapter;
pub use binance::BinanceAdapter;
