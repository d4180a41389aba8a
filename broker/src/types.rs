//! Shared broker types: accounts, holdings, portfolios.

use weightbook::Position;

/// A brokerage account visible to the token.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Account {
    pub id: String,
    pub name: String,
    pub account_type: String,
    pub status: String,
}

/// One instrument held in an account, as reported by the broker.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Holding {
    pub figi: String,
    pub name: String,
    pub ticker: String,
    pub instrument_type: String,
    pub quantity: f64,
    pub current_price: f64,
    /// `quantity * current_price`, computed on the broker side.
    pub current_value: f64,
    pub currency: String,
}

impl Holding {
    /// Build a holding and derive its current value.
    pub fn new(figi: impl Into<String>, quantity: f64, current_price: f64) -> Self {
        let figi = figi.into();
        Self {
            name: figi.clone(),
            figi,
            ticker: String::new(),
            instrument_type: String::new(),
            quantity,
            current_price,
            current_value: quantity * current_price,
            currency: String::new(),
        }
    }
}

impl From<&Holding> for Position {
    fn from(h: &Holding) -> Self {
        Position {
            id: h.figi.clone(),
            name: h.name.clone(),
            ticker: h.ticker.clone(),
            quantity: h.quantity,
            current_price: h.current_price,
            current_value: h.current_value,
            currency: h.currency.clone(),
        }
    }
}

/// Snapshot of an account's holdings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Portfolio {
    pub account_id: String,
    pub holdings: Vec<Holding>,
    /// Broker-reported total, which also covers cash and anything not in `holdings`.
    pub total_value: f64,
    pub currency: String,
}

impl Portfolio {
    /// Holdings as calculator input, in broker order.
    pub fn positions(&self) -> Vec<Position> {
        self.holdings.iter().map(Position::from).collect()
    }

    pub fn holding(&self, figi: &str) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.figi == figi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holding_value_and_defaults() {
        let h = Holding::new("BBG000B9XRY4", 3.0, 190.5);
        assert_eq!(h.current_value, 571.5);
        assert_eq!(h.name, "BBG000B9XRY4");
        assert!(h.ticker.is_empty());
    }

    #[test]
    fn portfolio_positions_keep_order_and_fields() {
        let mut sber = Holding::new("BBG004730N88", 10.0, 250.0);
        sber.ticker = "SBER".into();
        sber.currency = "rub".into();
        let portfolio = Portfolio {
            account_id: "2000".into(),
            holdings: vec![sber, Holding::new("BBG000B9XRY4", 1.0, 190.0)],
            total_value: 2690.0,
            currency: "rub".into(),
        };

        let positions = portfolio.positions();
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].id, "BBG004730N88");
        assert_eq!(positions[0].ticker, "SBER");
        assert_eq!(positions[0].current_value, 2500.0);
        assert_eq!(positions[0].currency, "rub");
        assert_eq!(positions[1].id, "BBG000B9XRY4");

        assert!(portfolio.holding("BBG000B9XRY4").is_some());
        assert!(portfolio.holding("nope").is_none());
    }
}
