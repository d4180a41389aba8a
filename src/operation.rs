//! Calculator output: per-instrument trade instructions and aggregate totals.

use std::fmt;

use crate::Mode;

/// What to do with one instrument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Action {
    Buy,
    Sell,
    /// Above target but selling is not allowed in this mode.
    Skip,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
            Action::Skip => write!(f, "SKIP"),
        }
    }
}

/// One trade instruction.
///
/// `quantity` and `value` are magnitudes; the direction lives in `action`.
/// `current_weight` is a percentage of the current selected total.
/// `target_value` is `target_weight` percent of the target base: the current
/// total in buy_and_sell, the new total less held zero-target value in
/// buy_only.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RebalanceOperation {
    pub id: String,
    pub name: String,
    pub ticker: String,
    pub currency: String,
    pub action: Action,
    pub quantity: f64,
    pub value: f64,
    pub current_value: f64,
    pub target_value: f64,
    pub current_weight: f64,
    pub target_weight: f64,
    pub price: f64,
}

impl RebalanceOperation {
    /// Value change with sign: positive for buys, negative otherwise.
    pub fn signed_value(&self) -> f64 {
        match self.action {
            Action::Buy => self.value,
            Action::Sell | Action::Skip => -self.value,
        }
    }
}

/// Result of a successful rebalance calculation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RebalanceResult {
    /// In selection order (first appearance in the position list).
    pub operations: Vec<RebalanceOperation>,
    pub current_total: f64,
    /// Equal to `current_total` for `BuyAndSell`; never below it for `BuyOnly`.
    pub new_total: f64,
    /// Zero for `BuyAndSell`.
    pub additional_investment: f64,
    pub mode: Mode,
}

impl RebalanceResult {
    /// True if nothing needs to be traded or skipped.
    pub fn is_balanced(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations_of(&self, action: Action) -> impl Iterator<Item = &RebalanceOperation> {
        self.operations.iter().filter(move |op| op.action == action)
    }

    /// Sum of `value` over buy operations.
    pub fn total_buy_value(&self) -> f64 {
        self.operations_of(Action::Buy).map(|op| op.value).sum()
    }

    /// Sum of `value` over sell operations.
    pub fn total_sell_value(&self) -> f64 {
        self.operations_of(Action::Sell).map(|op| op.value).sum()
    }
}
