//! Rebalance validation errors.

/// Errors returned by [`RebalanceCalculator::calculate`](crate::RebalanceCalculator::calculate).
///
/// Both are reported before any operation is built, so a failed calculation
/// never carries a partial plan.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum RebalanceError {
    /// Target weights do not sum to 100% within the configured tolerance.
    #[error("target weights must sum to 100%, got {sum}%")]
    InvalidWeights { sum: f64 },

    /// The selected positions have a total current value of exactly zero.
    #[error("total value of the selected positions is zero")]
    ZeroPortfolioValue,
}

impl RebalanceError {
    /// Stable machine-readable tag, suitable for a JSON `kind` field.
    pub fn kind(&self) -> &'static str {
        match self {
            RebalanceError::InvalidWeights { .. } => "invalid_weights",
            RebalanceError::ZeroPortfolioValue => "zero_portfolio_value",
        }
    }
}
