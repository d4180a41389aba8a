//! Error types for the rebalancer CLI.

use std::path::PathBuf;

/// All errors that can occur during rebalancer operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("target file error: {0}")]
    Target(String),

    #[error("failed to read target file {path}: {source}")]
    TargetRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse target JSON: {0}")]
    TargetParse(#[from] serde_json::Error),

    #[error("broker error: {0}")]
    Broker(#[from] weightbook_broker::BrokerError),

    #[error("rebalance failed: {0}")]
    Rebalance(#[from] weightbook::RebalanceError),

    #[error("encryption error: {0}")]
    Crypto(String),

    #[error("session store error: {0}")]
    Store(String),

    #[error("not logged in: run `rebalancer login` first")]
    NotLoggedIn,

    #[error("{0} check(s) failed")]
    Unhealthy(usize),

    #[error("aborted: {0}")]
    Aborted(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short machine-readable category, used in `--json` error output.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) | Error::ConfigRead { .. } | Error::ConfigParse(_) => "config",
            Error::Target(_) | Error::TargetRead { .. } | Error::TargetParse(_) => "target",
            Error::Broker(e) if e.is_auth() => "auth",
            Error::Broker(_) => "broker",
            Error::Rebalance(e) => e.kind(),
            Error::Crypto(_) => "crypto",
            Error::Store(_) => "store",
            Error::NotLoggedIn => "not_logged_in",
            Error::Unhealthy(_) => "unhealthy",
            Error::Aborted(_) => "aborted",
            Error::Io(_) => "io",
        }
    }

    /// Process exit code for this error.
    ///
    /// 2: the calculator rejected the input. 3: no stored token. 0: the user
    /// declined a prompt. Everything else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Rebalance(_) => 2,
            Error::NotLoggedIn => 3,
            Error::Aborted(_) => 0,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
