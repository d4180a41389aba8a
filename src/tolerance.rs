//! Absolute tolerances used by the calculator.

/// Allowed absolute deviation of the weight sum from 100, in percentage points.
pub const DEFAULT_WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// Value differences at or below this amount produce no operation.
pub const DEFAULT_MIN_TRADE_VALUE: f64 = 0.01;

/// Absolute thresholds for weight-sum validation and trade emission.
///
/// Both are absolute, not relative: they suit typical position sizes but get
/// coarse for very small portfolios and fine for very large ones.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerance {
    pub weight_sum: f64,
    pub min_trade_value: f64,
}

impl Tolerance {
    pub const fn new(weight_sum: f64, min_trade_value: f64) -> Self {
        Self {
            weight_sum,
            min_trade_value,
        }
    }

    /// True if `sum` is within `weight_sum` of 100. NaN is never within.
    #[inline]
    pub fn weights_balanced(&self, sum: f64) -> bool {
        (sum - 100.0).abs() <= self.weight_sum
    }

    /// True if a value difference is large enough to trade.
    #[inline]
    pub fn is_tradeable(&self, diff_value: f64) -> bool {
        diff_value.abs() > self.min_trade_value
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::new(DEFAULT_WEIGHT_SUM_TOLERANCE, DEFAULT_MIN_TRADE_VALUE)
    }
}
