//! Target specification (target.json) and offline plan file loading.

use std::path::Path;

use serde::Deserialize;
use weightbook::{Mode, Position, TargetWeights};

use crate::error::{Error, Result};

/// Target weights for one rebalance, with an optional mode.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetSpec {
    #[serde(default)]
    pub mode: Option<Mode>,
    pub targets: Vec<TargetEntry>,
}

/// A single target: instrument id + weight in percent.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetEntry {
    #[serde(alias = "figi")]
    pub id: String,
    pub weight: f64,
}

impl TargetSpec {
    /// Load and validate a target.json file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = read(path)?;
        Self::from_json(&contents)
    }

    /// Parse from a JSON string (useful for testing).
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: TargetSpec = serde_json::from_str(json)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Validate the entries. The weight sum is checked by the calculator.
    fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(Error::Target("targets list is empty".into()));
        }

        let mut seen = std::collections::HashSet::new();
        for t in &self.targets {
            if t.id.trim().is_empty() {
                return Err(Error::Target("empty instrument id".into()));
            }
            if !seen.insert(t.id.as_str()) {
                return Err(Error::Target(format!("duplicate instrument id: {}", t.id)));
            }
            if !t.weight.is_finite() || !(0.0..=100.0).contains(&t.weight) {
                return Err(Error::Target(format!(
                    "weight for {} ({}) must be between 0 and 100",
                    t.id, t.weight
                )));
            }
        }

        Ok(())
    }

    /// Weights keyed by instrument id, for the calculator.
    pub fn weights(&self) -> TargetWeights {
        self.targets
            .iter()
            .map(|t| (t.id.clone(), t.weight))
            .collect()
    }

    /// Mode to use: explicit override, else this file's mode, else `fallback`.
    pub fn resolve_mode(&self, explicit: Option<Mode>, fallback: Mode) -> Mode {
        explicit.or(self.mode).unwrap_or(fallback)
    }
}

/// Offline plan input: positions plus a target specification.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanFile {
    pub positions: Vec<Position>,
    #[serde(flatten)]
    pub target: TargetSpec,
}

impl PlanFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = read(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let plan: PlanFile = serde_json::from_str(json)?;
        plan.target.validate()?;
        Ok(plan)
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::TargetRead {
        path: path.to_path_buf(),
        source: e,
    })
}
