//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use serde::Deserialize;
use weightbook::{DEFAULT_MIN_TRADE_VALUE, DEFAULT_WEIGHT_SUM_TOLERANCE, Mode, Tolerance};
use weightbook_broker::tinkoff::client::PRODUCTION_URL;

use crate::error::{Error, Result};

/// Top-level configuration. Every section may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub broker: BrokerConfig,
    pub session: SessionConfig,
    pub rebalance: RebalanceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            base_url: PRODUCTION_URL.into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub dir: String,
    pub store_file: String,
    pub key_file: String,
    /// Environment variable holding the hex-encoded encryption key.
    pub key_env: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dir: "./.weightbook".into(),
            store_file: "sessions.json".into(),
            key_file: ".encryption_key".into(),
            key_env: "WEIGHTBOOK_ENCRYPTION_KEY".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RebalanceConfig {
    pub default_mode: Mode,
    pub weight_sum_tolerance: f64,
    pub min_trade_value: f64,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            default_mode: Mode::BuyOnly,
            weight_sum_tolerance: DEFAULT_WEIGHT_SUM_TOLERANCE,
            min_trade_value: DEFAULT_MIN_TRADE_VALUE,
        }
    }
}

impl RebalanceConfig {
    pub fn tolerance(&self) -> Tolerance {
        Tolerance::new(self.weight_sum_tolerance, self.min_trade_value)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: String,
    pub audit_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: "./logs".into(),
            audit_file: "audit.jsonl".into(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Load config from a TOML file, or use defaults if it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            info!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        if self.broker.base_url.trim().is_empty() {
            return Err(Error::Config("broker.base_url must not be empty".into()));
        }
        if self.broker.timeout_secs == 0 {
            return Err(Error::Config("broker.timeout_secs must be > 0".into()));
        }
        for (name, value) in [
            ("weight_sum_tolerance", self.rebalance.weight_sum_tolerance),
            ("min_trade_value", self.rebalance.min_trade_value),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "rebalance.{name} must be a finite number >= 0"
                )));
            }
        }
        for (name, value) in [
            ("session.dir", &self.session.dir),
            ("session.store_file", &self.session.store_file),
            ("session.key_file", &self.session.key_file),
            ("session.key_env", &self.session.key_env),
            ("logging.audit_file", &self.logging.audit_file),
        ] {
            if value.is_empty() {
                return Err(Error::Config(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.broker.timeout_secs)
    }

    /// Path of the encrypted session store.
    pub fn store_path(&self) -> PathBuf {
        Path::new(&self.session.dir).join(&self.session.store_file)
    }

    /// Path of the generated encryption key.
    pub fn key_path(&self) -> PathBuf {
        Path::new(&self.session.dir).join(&self.session.key_file)
    }

    /// Path of the file holding the active session id.
    pub fn current_session_path(&self) -> PathBuf {
        Path::new(&self.session.dir).join("current_session")
    }

    /// Full path to the audit log file.
    pub fn audit_path(&self) -> PathBuf {
        Path::new(&self.logging.dir).join(&self.logging.audit_file)
    }
}
