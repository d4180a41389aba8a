//! Mock broker for testing. Implements the `Broker` trait with configurable data.
//!
//! Use this in integration tests to simulate broker responses without network calls.
//!
//! ```
//! use weightbook_broker::Broker;
//! use weightbook_broker::mock::MockBroker;
//!
//! let broker = MockBroker::builder()
//!     .with_account("2000", "Brokerage")
//!     .with_holding("2000", "BBG004730N88", "SBER", 10.0, 250.0)
//!     .build();
//!
//! let portfolio = broker.portfolio("2000").unwrap();
//! assert_eq!(portfolio.holdings[0].current_value, 2500.0);
//! ```

use std::sync::Mutex;

use crate::Broker;
use crate::error::BrokerError;
use crate::types::*;

/// Builder for `MockBroker`.
pub struct MockBrokerBuilder {
    accounts: Vec<Account>,
    holdings: Vec<(String, Holding)>,
    cash: Vec<(String, f64)>,
    currency: String,
    reject_token: bool,
}

impl MockBrokerBuilder {
    pub fn with_account(mut self, id: &str, name: &str) -> Self {
        self.accounts.push(Account {
            id: id.to_string(),
            name: name.to_string(),
            account_type: "ACCOUNT_TYPE_TINKOFF".into(),
            status: "ACCOUNT_STATUS_OPEN".into(),
        });
        self
    }

    pub fn with_holding(
        mut self,
        account_id: &str,
        figi: &str,
        ticker: &str,
        quantity: f64,
        price: f64,
    ) -> Self {
        let mut holding = Holding::new(figi, quantity, price);
        holding.ticker = ticker.to_string();
        holding.currency = self.currency.clone();
        self.holdings.push((account_id.to_string(), holding));
        self
    }

    /// Uninvested cash counted in the account's total but not as a holding.
    pub fn with_cash(mut self, account_id: &str, amount: f64) -> Self {
        self.cash.push((account_id.to_string(), amount));
        self
    }

    pub fn currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_string();
        self
    }

    /// Every call fails with `BrokerError::Auth`, as for a revoked token.
    pub fn reject_token(mut self) -> Self {
        self.reject_token = true;
        self
    }

    pub fn build(self) -> MockBroker {
        MockBroker {
            accounts: self.accounts,
            holdings: self.holdings,
            cash: self.cash,
            currency: self.currency,
            reject_token: self.reject_token,
            requests: Mutex::new(Vec::new()),
        }
    }
}

/// A mock broker that records portfolio requests and returns fixed data.
pub struct MockBroker {
    accounts: Vec<Account>,
    holdings: Vec<(String, Holding)>,
    cash: Vec<(String, f64)>,
    currency: String,
    reject_token: bool,
    requests: Mutex<Vec<String>>,
}

impl MockBroker {
    pub fn builder() -> MockBrokerBuilder {
        MockBrokerBuilder {
            accounts: Vec::new(),
            holdings: Vec::new(),
            cash: Vec::new(),
            currency: "rub".into(),
            reject_token: false,
        }
    }

    /// Account ids passed to `portfolio`, in call order (for assertion in tests).
    pub fn requested_portfolios(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn check_token(&self) -> Result<(), BrokerError> {
        if self.reject_token {
            return Err(BrokerError::Auth("mock: token rejected".into()));
        }
        Ok(())
    }
}

impl Broker for MockBroker {
    fn accounts(&self) -> Result<Vec<Account>, BrokerError> {
        self.check_token()?;
        Ok(self.accounts.clone())
    }

    fn portfolio(&self, account_id: &str) -> Result<Portfolio, BrokerError> {
        self.check_token()?;
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(account_id.to_string());
        }

        if !self.accounts.iter().any(|a| a.id == account_id) {
            return Err(BrokerError::NotFound(format!("account {account_id}")));
        }

        let holdings: Vec<Holding> = self
            .holdings
            .iter()
            .filter(|(acc, _)| acc == account_id)
            .map(|(_, h)| h.clone())
            .collect();
        let cash: f64 = self
            .cash
            .iter()
            .filter(|(acc, _)| acc == account_id)
            .map(|(_, amount)| amount)
            .sum();
        let total_value = holdings.iter().map(|h| h.current_value).sum::<f64>() + cash;

        Ok(Portfolio {
            account_id: account_id.to_string(),
            holdings,
            total_value,
            currency: self.currency.clone(),
        })
    }
}
