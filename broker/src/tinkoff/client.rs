//! Tinkoff Invest REST gateway client.

use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use zeroize::Zeroize;

use super::to_holding;
use super::types::{
    ErrorBody, GetAccountsResponse, Instrument, InstrumentResponse, PortfolioResponse,
};
use crate::Broker;
use crate::error::BrokerError;
use crate::types::{Account, Portfolio};

/// Production REST gateway.
pub const PRODUCTION_URL: &str = "https://invest-public-api.tinkoff.ru/rest";

/// Sandbox REST gateway.
pub const SANDBOX_URL: &str = "https://sandbox-invest-public-api.tinkoff.ru/rest";

const CONTRACT: &str = "tinkoff.public.invest.api.contract.v1";

/// Blocking Tinkoff Invest REST client.
pub struct TinkoffClient {
    client: Client,
    token: String,
    base_url: String,
}

impl TinkoffClient {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(token: &str, base_url: &str, timeout: Duration) -> Result<Self, BrokerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BrokerError::Connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Full URL of a gateway method, e.g. `UsersService/GetAccounts`.
    pub fn method_url(&self, service: &str, method: &str) -> String {
        format!("{}/{CONTRACT}.{service}/{method}", self.base_url)
    }

    /// POST a JSON request to a gateway method and parse the response.
    fn call<T: DeserializeOwned>(
        &self,
        service: &str,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, BrokerError> {
        let url = self.method_url(service, method);
        debug!("Tinkoff request: {service}/{method}");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .map_err(|e| BrokerError::Connection(format!("{method} request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(classify_status(status.as_u16(), &text));
        }

        resp.json::<T>()
            .map_err(|e| BrokerError::Parse(format!("{method}: {e}")))
    }

    /// `UsersService/GetAccounts`.
    pub fn get_accounts(&self) -> Result<GetAccountsResponse, BrokerError> {
        self.call("UsersService", "GetAccounts", serde_json::json!({}))
    }

    /// `OperationsService/GetPortfolio`.
    pub fn get_portfolio(&self, account_id: &str) -> Result<PortfolioResponse, BrokerError> {
        self.call(
            "OperationsService",
            "GetPortfolio",
            serde_json::json!({ "accountId": account_id }),
        )
    }

    /// `InstrumentsService/GetInstrumentBy` with a FIGI.
    pub fn get_instrument_by_figi(&self, figi: &str) -> Result<Instrument, BrokerError> {
        let resp: InstrumentResponse = self.call(
            "InstrumentsService",
            "GetInstrumentBy",
            serde_json::json!({ "idType": "INSTRUMENT_ID_TYPE_FIGI", "id": figi }),
        )?;
        Ok(resp.instrument)
    }
}

impl Drop for TinkoffClient {
    fn drop(&mut self) {
        self.token.zeroize();
    }
}

impl Broker for TinkoffClient {
    fn accounts(&self) -> Result<Vec<Account>, BrokerError> {
        Ok(self
            .get_accounts()?
            .accounts
            .into_iter()
            .map(Account::from)
            .collect())
    }

    fn portfolio(&self, account_id: &str) -> Result<Portfolio, BrokerError> {
        let resp = self.get_portfolio(account_id)?;

        let holdings = resp
            .positions
            .iter()
            .map(|pos| {
                let instrument = if pos.figi.is_empty() {
                    None
                } else {
                    match self.get_instrument_by_figi(&pos.figi) {
                        Ok(i) => Some(i),
                        Err(e) => {
                            warn!("Instrument lookup failed for {}: {e}", pos.figi);
                            None
                        }
                    }
                };
                to_holding(pos, instrument.as_ref())
            })
            .collect();

        let (total_value, currency) = match &resp.total_amount_portfolio {
            Some(total) => (total.to_f64(), total.currency.clone()),
            None => (0.0, super::DEFAULT_CURRENCY.to_string()),
        };

        Ok(Portfolio {
            account_id: account_id.to_string(),
            holdings,
            total_value,
            currency,
        })
    }
}

/// Map a non-success HTTP status (and its body) to a broker error.
pub fn classify_status(status: u16, body: &str) -> BrokerError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .filter(|b| !b.message.is_empty())
        .map(|b| format!("{} (code {})", b.message, b.code))
        .unwrap_or_else(|| body.to_string());

    match status {
        401 | 403 => BrokerError::Auth(format!("{status}: {detail}")),
        404 => BrokerError::NotFound(detail),
        429 => BrokerError::RateLimit,
        _ => BrokerError::Connection(format!("gateway returned {status}: {detail}")),
    }
}
