//! Target-weight rebalancing calculator.
//!
//! Pure function of (positions, target weights, mode). Validation runs before
//! anything is built, so a failure never carries a partial plan.

use rustc_hash::FxHashMap;

use crate::{
    Action, Mode, Position, RebalanceError, RebalanceOperation, RebalanceResult, TargetWeights,
    Tolerance,
};

/// Rebalancing calculator parameterized by its tolerances.
///
/// Holds no state between calls; one instance can serve any number of
/// threads.
#[derive(Clone, Copy, Debug, Default)]
pub struct RebalanceCalculator {
    tolerance: Tolerance,
}

/// A selected position paired with its target fraction (weight / 100).
struct Selected<'a> {
    position: &'a Position,
    weight: f64,
}

impl Selected<'_> {
    #[inline]
    fn fraction(&self) -> f64 {
        self.weight / 100.0
    }
}

impl RebalanceCalculator {
    pub fn new(tolerance: Tolerance) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    /// Compute the operations that bring the selected positions to `targets`.
    ///
    /// Positions whose id is not in `targets` are ignored: they add nothing
    /// to the totals and receive no operation.
    ///
    /// # Errors
    ///
    /// - [`RebalanceError::InvalidWeights`] if the weights do not sum to 100
    ///   within the weight-sum tolerance.
    /// - [`RebalanceError::ZeroPortfolioValue`] if the selected positions are
    ///   worth exactly zero.
    pub fn calculate(
        &self,
        positions: &[Position],
        targets: &TargetWeights,
        mode: Mode,
    ) -> Result<RebalanceResult, RebalanceError> {
        let sum = targets.total();
        if !self.tolerance.weights_balanced(sum) {
            return Err(RebalanceError::InvalidWeights { sum });
        }

        let selected = select(positions, targets);
        let current_total: f64 = selected.iter().map(|s| s.position.current_value).sum();
        if current_total == 0.0 {
            return Err(RebalanceError::ZeroPortfolioValue);
        }

        // Targets are shares of `target_base`. In buy_only, zero-target
        // holdings cannot be sold, so they stay outside the base.
        let (new_total, target_base) = match mode {
            Mode::BuyOnly => {
                let held = zero_target_value(&selected);
                let base = current_total * buy_only_scale_factor(&selected, current_total);
                let new_total = (base + held).max(current_total);
                (new_total, new_total - held)
            }
            Mode::BuyAndSell => (current_total, current_total),
        };

        let operations = selected
            .iter()
            .filter_map(|s| self.operation(s, current_total, target_base, mode))
            .collect();

        let additional_investment = match mode {
            Mode::BuyOnly => new_total - current_total,
            Mode::BuyAndSell => 0.0,
        };

        Ok(RebalanceResult {
            operations,
            current_total,
            new_total,
            additional_investment,
            mode,
        })
    }

    /// Build the operation for one position, or `None` if its value diff is
    /// within the trade threshold.
    fn operation(
        &self,
        s: &Selected<'_>,
        current_total: f64,
        target_base: f64,
        mode: Mode,
    ) -> Option<RebalanceOperation> {
        let pos = s.position;
        let target_value = target_base * s.fraction();
        let diff_value = target_value - pos.current_value;

        if !self.tolerance.is_tradeable(diff_value) {
            return None;
        }

        let action = if diff_value > 0.0 {
            Action::Buy
        } else if mode.allows_sell() {
            Action::Sell
        } else {
            Action::Skip
        };

        let quantity = if pos.current_price > 0.0 {
            diff_value.abs() / pos.current_price
        } else {
            0.0
        };

        Some(RebalanceOperation {
            id: pos.id.clone(),
            name: pos.name.clone(),
            ticker: pos.ticker.clone(),
            currency: pos.currency.clone(),
            action,
            quantity,
            value: diff_value.abs(),
            current_value: pos.current_value,
            target_value,
            current_weight: pos.current_value / current_total * 100.0,
            target_weight: s.weight,
            price: pos.current_price,
        })
    }
}

/// Rebalance with default tolerances.
pub fn calculate(
    positions: &[Position],
    targets: &TargetWeights,
    mode: Mode,
) -> Result<RebalanceResult, RebalanceError> {
    RebalanceCalculator::default().calculate(positions, targets, mode)
}

/// Positions whose id is targeted, in order of first appearance.
///
/// A repeated id keeps its first slot and takes the later record.
fn select<'a>(positions: &'a [Position], targets: &TargetWeights) -> Vec<Selected<'a>> {
    let mut slots: FxHashMap<&str, usize> = FxHashMap::default();
    let mut selected: Vec<Selected<'a>> = Vec::new();

    for position in positions {
        let Some(weight) = targets.get(&position.id) else {
            continue;
        };
        let entry = Selected { position, weight };
        match slots.get(position.id.as_str()) {
            Some(&slot) => selected[slot] = entry,
            None => {
                slots.insert(position.id.as_str(), selected.len());
                selected.push(entry);
            }
        }
    }

    selected
}

/// Smallest multiple of the current total that covers every positive-target
/// holding at its target weight: `max(current_value / fraction) / current_total`.
///
/// Zero-target holdings are left out. With no positive-target holding
/// selected the factor is 0.
fn buy_only_scale_factor(selected: &[Selected<'_>], current_total: f64) -> f64 {
    selected
        .iter()
        .filter(|s| s.fraction() > 0.0)
        .map(|s| s.position.current_value / s.fraction() / current_total)
        .fold(0.0_f64, f64::max)
}

/// Value of the selected holdings whose target weight is zero.
fn zero_target_value(selected: &[Selected<'_>]) -> f64 {
    selected
        .iter()
        .filter(|s| s.fraction() <= 0.0)
        .map(|s| s.position.current_value)
        .sum()
}
