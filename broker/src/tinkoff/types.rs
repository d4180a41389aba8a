//! Tinkoff Invest REST gateway wire types.
//!
//! The gateway uses the protobuf JSON mapping: camelCase field names and
//! 64-bit integers encoded as strings.

use serde::{Deserialize, Deserializer};

/// Fixed-point number: `units + nano / 1e9`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Quotation {
    #[serde(default, deserialize_with = "de_units")]
    pub units: i64,
    #[serde(default)]
    pub nano: i32,
}

impl Quotation {
    pub fn to_f64(&self) -> f64 {
        self.units as f64 + self.nano as f64 / 1_000_000_000.0
    }
}

/// Fixed-point amount with a currency code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MoneyValue {
    #[serde(default)]
    pub currency: String,
    #[serde(default, deserialize_with = "de_units")]
    pub units: i64,
    #[serde(default)]
    pub nano: i32,
}

impl MoneyValue {
    pub fn to_f64(&self) -> f64 {
        self.units as f64 + self.nano as f64 / 1_000_000_000.0
    }
}

/// `UsersService/GetAccounts` response.
#[derive(Debug, Deserialize)]
pub struct GetAccountsResponse {
    #[serde(default)]
    pub accounts: Vec<AccountInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub id: String,
    #[serde(rename = "type", default)]
    pub account_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
}

/// `OperationsService/GetPortfolio` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioResponse {
    #[serde(default)]
    pub total_amount_portfolio: Option<MoneyValue>,
    #[serde(default)]
    pub positions: Vec<PortfolioPosition>,
    #[serde(default)]
    pub account_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioPosition {
    #[serde(default)]
    pub figi: String,
    #[serde(default)]
    pub instrument_type: String,
    #[serde(default)]
    pub quantity: Option<Quotation>,
    #[serde(default)]
    pub current_price: Option<MoneyValue>,
    #[serde(default)]
    pub instrument_uid: String,
}

/// `InstrumentsService/GetInstrumentBy` response.
#[derive(Debug, Deserialize)]
pub struct InstrumentResponse {
    pub instrument: Instrument,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    #[serde(default)]
    pub figi: String,
    #[serde(default)]
    pub ticker: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub instrument_type: String,
    #[serde(default)]
    pub currency: String,
}

/// Error body returned alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// Accept int64 either as a JSON number or as a decimal string.
fn de_units<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Units {
        Number(i64),
        Text(String),
    }

    match Units::deserialize(deserializer)? {
        Units::Number(n) => Ok(n),
        Units::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}
