//! Target weight distribution: instrument id → percentage of the rebalanced total.

use rustc_hash::FxHashMap;

/// Target weights in percent (0–100), keyed by instrument id.
///
/// Only ids present here take part in a rebalance. Ids with no matching
/// position still count toward [`total`](Self::total).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TargetWeights {
    weights: FxHashMap<String, f64>,
}

impl TargetWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target weight for `id`, returning the previous one.
    pub fn insert(&mut self, id: impl Into<String>, percent: f64) -> Option<f64> {
        self.weights.insert(id.into(), percent)
    }

    /// Target weight in percent for `id`.
    #[inline]
    pub fn get(&self, id: &str) -> Option<f64> {
        self.weights.get(id).copied()
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.weights.contains_key(id)
    }

    /// Sum of all weights in percent.
    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(id, w)| (id.as_str(), *w))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for TargetWeights {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            weights: iter.into_iter().map(|(k, w)| (k.into(), w)).collect(),
        }
    }
}
