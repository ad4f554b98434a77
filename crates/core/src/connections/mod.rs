pub mod connections_model;
pub mod connections_traits;

pub use connections_model::{Connection, ConnectionStatus, ExchangeCredentials};
pub use connections_traits::{ConnectionRepositoryTrait, CredentialResolverTrait};
