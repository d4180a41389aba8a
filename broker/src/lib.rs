//! Portfolio sources for weightbook.
//!
//! Provides a `Broker` trait that supplies the rebalancing calculator with
//! accounts and their holdings. Implementations:
//!
//! - **Mock** ([`mock::MockBroker`]): in-memory, for tests
//! - **Tinkoff** (feature `tinkoff`): Tinkoff Invest REST gateway

pub mod error;
pub mod mock;
pub mod types;

#[cfg(feature = "tinkoff")]
pub mod tinkoff;

pub use error::BrokerError;
pub use types::*;

/// A read-only brokerage connection authorized by an API token.
pub trait Broker {
    /// List the accounts the token can see.
    fn accounts(&self) -> Result<Vec<Account>, BrokerError>;

    /// Fetch the current holdings of one account.
    fn portfolio(&self, account_id: &str) -> Result<Portfolio, BrokerError>;
}

impl<B: Broker + ?Sized> Broker for Box<B> {
    fn accounts(&self) -> Result<Vec<Account>, BrokerError> {
        (**self).accounts()
    }

    fn portfolio(&self, account_id: &str) -> Result<Portfolio, BrokerError> {
        (**self).portfolio(account_id)
    }
}
