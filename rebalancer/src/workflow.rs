//! Command workflows: login, session management, portfolio and rebalance.
//!
//! Each CLI command maps to one method on [`App`]. Methods return data and
//! leave printing to the caller, so they run the same against a live broker
//! or a [`MockBroker`](weightbook_broker::mock::MockBroker).

use log::{debug, info, warn};
use serde::Serialize;
use weightbook::{Mode, Position, RebalanceCalculator, RebalanceResult};
use weightbook_broker::{Account, Broker, BrokerError, Portfolio};
use zeroize::Zeroizing;

use crate::audit::{self, AuditLog};
use crate::broker::{BrokerConnector, TinkoffConnector};
use crate::config::Config;
use crate::crypto::{self, KeySource, TokenCipher};
use crate::error::{Error, Result};
use crate::session::{CurrentSession, TokenVault};
use crate::store::{FileStore, SessionStore};
use crate::target::{PlanFile, TargetSpec};

/// Result of a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub username: String,
    pub accounts: Vec<Account>,
}

/// Whether a session is active, and for whom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub logged_in: bool,
    pub username: Option<String>,
}

/// Everything a command needs: config, token vault, session pointer,
/// broker connector and audit trail.
pub struct App<S, C> {
    config: Config,
    vault: TokenVault<S>,
    current: CurrentSession,
    connector: C,
    audit: AuditLog,
}

impl App<FileStore, TinkoffConnector> {
    /// The production wiring: file-backed session store and Tinkoff gateway.
    pub fn open(config: Config) -> Result<Self> {
        let (key, source) = crypto::load_or_create_key(&config.session.key_env, &config.key_path())?;
        match source {
            KeySource::Env => debug!("Encryption key from ${}", config.session.key_env),
            KeySource::File => debug!("Encryption key from {}", config.key_path().display()),
            KeySource::Generated => {}
        }
        let cipher = TokenCipher::new(&key);
        let store = FileStore::new(config.store_path());
        let connector = TinkoffConnector::from_config(&config);
        Self::new(config, store, cipher, connector)
    }
}

impl<S: SessionStore, C: BrokerConnector> App<S, C> {
    pub fn new(config: Config, store: S, cipher: TokenCipher, connector: C) -> Result<Self> {
        let audit = AuditLog::open(&config.audit_path())?;
        let current = CurrentSession::new(config.current_session_path());
        Ok(Self {
            config,
            vault: TokenVault::new(store, cipher),
            current,
            connector,
            audit,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn vault(&self) -> &TokenVault<S> {
        &self.vault
    }

    /// Validate `token` by listing accounts, then store it for the current
    /// session. A first login creates the session.
    ///
    /// Without an explicit `username` the first account's name is used.
    pub fn login(&mut self, token: &str, username: Option<&str>) -> Result<LoginOutcome> {
        let token = token.trim();
        if token.is_empty() {
            return Err(BrokerError::Auth("empty token".into()).into());
        }

        let broker = self.connector.connect(token)?;
        let accounts = broker.accounts()?;
        info!("Token accepted: {} account(s) visible", accounts.len());

        let username = match username.map(str::trim).filter(|u| !u.is_empty()) {
            Some(u) => u.to_string(),
            None => accounts
                .first()
                .map(|a| a.name.clone())
                .unwrap_or_else(|| "default".to_string()),
        };

        let session_id = self.current.load_or_create()?;
        self.vault.login(&session_id, token, &username)?;
        audit::log_login(&mut self.audit, &username, accounts.len())?;

        Ok(LoginOutcome { username, accounts })
    }

    /// End the current session. The session id and stored token are kept,
    /// so `forget` still works and the next login reuses the record.
    pub fn logout(&mut self) -> Result<bool> {
        let ended = self.current.deactivate()?;
        if ended {
            self.audit.log_simple("logout")?;
        }
        Ok(ended)
    }

    /// Delete the stored token of the last session, logged out or not, and
    /// drop the session id.
    pub fn forget(&mut self) -> Result<bool> {
        let session_id = self.current.last()?.ok_or(Error::NotLoggedIn)?;
        let removed = self.vault.forget(&session_id)?;
        self.current.clear()?;
        if removed {
            self.audit.log_simple("token_forgotten")?;
        } else {
            warn!("No stored token for the current session");
        }
        Ok(removed)
    }

    pub fn status(&self) -> Result<Status> {
        let username = match self.current.load()? {
            Some(id) => self.vault.username(&id)?,
            None => None,
        };
        Ok(Status {
            logged_in: username.is_some(),
            username,
        })
    }

    pub fn accounts(&self) -> Result<Vec<Account>> {
        Ok(self.connect()?.accounts()?)
    }

    pub fn portfolio(&mut self, account_id: &str) -> Result<Portfolio> {
        let portfolio = self.connect()?.portfolio(account_id)?;
        info!(
            "Fetched {} holding(s) for account {}",
            portfolio.holdings.len(),
            account_id
        );
        audit::log_portfolio(&mut self.audit, &portfolio)?;
        Ok(portfolio)
    }

    /// Fetch the account's holdings and compute a plan toward `spec`.
    pub fn rebalance(
        &mut self,
        account_id: &str,
        spec: &TargetSpec,
        source: &str,
        mode: Option<Mode>,
    ) -> Result<RebalanceResult> {
        let portfolio = self.portfolio(account_id)?;
        self.compute(&portfolio.positions(), spec, source, mode)
    }

    /// Compute a plan from a plan file. No broker or login involved.
    pub fn plan(&mut self, plan: &PlanFile, source: &str, mode: Option<Mode>) -> Result<RebalanceResult> {
        self.compute(&plan.positions, &plan.target, source, mode)
    }

    fn compute(
        &mut self,
        positions: &[Position],
        spec: &TargetSpec,
        source: &str,
        mode: Option<Mode>,
    ) -> Result<RebalanceResult> {
        let mode = spec.resolve_mode(mode, self.config.rebalance.default_mode);
        let calculator = RebalanceCalculator::new(self.config.rebalance.tolerance());
        debug!(
            "Calculating {mode} plan: {} position(s), {} target(s)",
            positions.len(),
            spec.targets.len()
        );

        match calculator.calculate(positions, &spec.weights(), mode) {
            Ok(result) => {
                info!(
                    "Plan from {source}: {} operation(s), current total {:.2}",
                    result.operations.len(),
                    result.current_total
                );
                audit::log_rebalance(&mut self.audit, source, &result)?;
                Ok(result)
            }
            Err(e) => {
                warn!("Rebalance rejected for {source}: {e}");
                audit::log_rebalance_failed(&mut self.audit, source, &e)?;
                Err(e.into())
            }
        }
    }

    /// Broker connection for the current session's token.
    fn connect(&self) -> Result<Box<dyn Broker>> {
        let session_id = self.current.load()?.ok_or(Error::NotLoggedIn)?;
        let token = Zeroizing::new(self.vault.token(&session_id)?.ok_or(Error::NotLoggedIn)?);
        self.connector.connect(&token)
    }
}

/// Ask before an irreversible step. `Err(Aborted)` when declined.
pub fn confirm(prompt: &str) -> Result<()> {
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| Error::Aborted(format!("confirmation prompt failed: {e}")))?;
    if confirmed {
        Ok(())
    } else {
        Err(Error::Aborted("cancelled by user".into()))
    }
}

/// Read a token interactively without echoing it.
pub fn prompt_token() -> Result<Zeroizing<String>> {
    dialoguer::Password::new()
        .with_prompt("Tinkoff Invest API token")
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| Error::Aborted(format!("token prompt failed: {e}")))
}
