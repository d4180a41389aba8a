//! Calculator input: one holding as supplied by the position source.

/// A single holding of one instrument.
///
/// `current_value` is supplied pre-computed (quantity × price on the
/// supplier's side); the calculator trusts it and only divides by
/// `current_price` when deriving a trade quantity.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Stable instrument identifier (a FIGI for Tinkoff portfolios).
    #[cfg_attr(feature = "serde", serde(alias = "figi"))]
    pub id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ticker: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub quantity: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub current_price: f64,
    pub current_value: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub currency: String,
}

impl Position {
    /// Build a position from a quantity and unit price.
    pub fn new(id: impl Into<String>, quantity: f64, current_price: f64) -> Self {
        Self {
            id: id.into(),
            quantity,
            current_price,
            current_value: quantity * current_price,
            ..Default::default()
        }
    }

    /// Build a position from a pre-computed value and unit price.
    pub fn with_value(id: impl Into<String>, current_value: f64, current_price: f64) -> Self {
        let quantity = if current_price > 0.0 {
            current_value / current_price
        } else {
            0.0
        };
        Self {
            id: id.into(),
            quantity,
            current_price,
            current_value,
            ..Default::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>, ticker: impl Into<String>) -> Self {
        self.name = name.into();
        self.ticker = ticker.into();
        self
    }

    pub fn in_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_computes_value() {
        let p = Position::new("A", 12.0, 2.5);
        assert_eq!(p.current_value, 30.0);
        assert_eq!(p.quantity, 12.0);
    }

    #[test]
    fn with_value_derives_quantity() {
        let p = Position::with_value("A", 700.0, 10.0);
        assert_eq!(p.quantity, 70.0);

        let free = Position::with_value("B", 50.0, 0.0);
        assert_eq!(free.quantity, 0.0);
        assert_eq!(free.current_value, 50.0);
    }

    #[test]
    fn display_fields() {
        let p = Position::new("BBG000B9XRY4", 1.0, 190.0)
            .named("Apple", "AAPL")
            .in_currency("usd");
        assert_eq!(p.name, "Apple");
        assert_eq!(p.ticker, "AAPL");
        assert_eq!(p.currency, "usd");
    }
}
