//! Turning a stored token into a live broker connection.

use std::time::Duration;

use weightbook_broker::Broker;
use weightbook_broker::tinkoff::TinkoffClient;

use crate::config::Config;
use crate::error::Result;

/// Opens a broker connection authorized by an API token.
pub trait BrokerConnector {
    fn connect(&self, token: &str) -> Result<Box<dyn Broker>>;
}

impl<F> BrokerConnector for F
where
    F: Fn(&str) -> Result<Box<dyn Broker>>,
{
    fn connect(&self, token: &str) -> Result<Box<dyn Broker>> {
        self(token)
    }
}

/// Connector for the Tinkoff Invest REST gateway.
#[derive(Debug, Clone)]
pub struct TinkoffConnector {
    pub base_url: String,
    pub timeout: Duration,
}

impl TinkoffConnector {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.broker.base_url.clone(),
            timeout: config.timeout(),
        }
    }
}

impl BrokerConnector for TinkoffConnector {
    fn connect(&self, token: &str) -> Result<Box<dyn Broker>> {
        let client = TinkoffClient::new(token, &self.base_url, self.timeout)?;
        Ok(Box::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weightbook_broker::mock::MockBroker;

    #[test]
    fn from_config() {
        let config = Config::default();
        let c = TinkoffConnector::from_config(&config);
        assert_eq!(c.base_url, config.broker.base_url);
        assert_eq!(c.timeout, Duration::from_secs(30));
    }

    #[test]
    fn closures_are_connectors() {
        let connector = |token: &str| -> Result<Box<dyn Broker>> {
            assert_eq!(token, "t.abc");
            Ok(Box::new(
                MockBroker::builder().with_account("1", "Main").build(),
            ))
        };
        let broker = connector.connect("t.abc").unwrap();
        assert_eq!(broker.accounts().unwrap().len(), 1);
    }
}
