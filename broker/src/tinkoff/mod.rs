//! Tinkoff Invest broker implementation.
//!
//! Talks to the REST gateway of the Tinkoff Invest API with a Bearer token.
//! Read-only: accounts, portfolios, and instrument lookups.

pub mod client;
pub mod types;

use crate::types::{Account, Holding};

pub use client::TinkoffClient;

/// Currency assumed for positions the gateway reports without a price.
pub const DEFAULT_CURRENCY: &str = "RUB";

impl From<types::AccountInfo> for Account {
    fn from(a: types::AccountInfo) -> Self {
        Account {
            id: a.id,
            name: a.name,
            account_type: a.account_type,
            status: a.status,
        }
    }
}

/// Convert a portfolio position, with its instrument if the lookup succeeded.
///
/// Without an instrument the FIGI doubles as the display name and the
/// position's own instrument type is kept.
pub fn to_holding(pos: &types::PortfolioPosition, instrument: Option<&types::Instrument>) -> Holding {
    let quantity = pos.quantity.map(|q| q.to_f64()).unwrap_or(0.0);
    let current_price = pos.current_price.as_ref().map(|p| p.to_f64()).unwrap_or(0.0);
    let currency = pos
        .current_price
        .as_ref()
        .map(|p| p.currency.clone())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    let (name, ticker, instrument_type) = match instrument {
        Some(i) => (i.name.clone(), i.ticker.clone(), i.instrument_type.clone()),
        None => (pos.figi.clone(), String::new(), pos.instrument_type.clone()),
    };

    Holding {
        figi: pos.figi.clone(),
        name,
        ticker,
        instrument_type,
        quantity,
        current_price,
        current_value: quantity * current_price,
        currency,
    }
}
