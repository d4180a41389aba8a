//! Broker error types.

/// Errors that can occur while talking to a brokerage.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate limit exceeded")]
    RateLimit,

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

impl BrokerError {
    /// True if the token was refused by the broker.
    pub fn is_auth(&self) -> bool {
        matches!(self, BrokerError::Auth(_))
    }
}
