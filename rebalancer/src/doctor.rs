//! Self-checks of the local setup: encryption key, session store, current
//! session, and whether the stored token still decrypts.
//!
//! Nothing here creates files or contacts the broker.

use std::fmt;

use serde::Serialize;

use crate::config::Config;
use crate::crypto::{self, EncryptionKey, KeySource, TokenCipher};
use crate::session::{CurrentSession, TokenVault};
use crate::store::FileStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            CheckStatus::Ok => "OK",
            CheckStatus::Warn => "WARN",
            CheckStatus::Fail => "FAIL",
        })
    }
}

/// Outcome of one check.
#[derive(Debug, Clone, Serialize)]
pub struct Check {
    pub name: &'static str,
    pub status: CheckStatus,
    pub detail: String,
}

impl Check {
    fn new(name: &'static str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name,
            status,
            detail: detail.into(),
        }
    }
}

/// Run every check, reading the key from the configured environment variable.
pub fn run(config: &Config) -> Vec<Check> {
    diagnose(config, std::env::var(&config.session.key_env).ok())
}

/// [`run`] with the environment value passed in.
pub fn diagnose(config: &Config, env_key: Option<String>) -> Vec<Check> {
    let mut checks = vec![Check::new(
        "config",
        CheckStatus::Ok,
        format!(
            "{} (timeout {}s)",
            config.broker.base_url, config.broker.timeout_secs
        ),
    )];

    let key = match crypto::existing_key(env_key, &config.key_path()) {
        Ok(Some((key, source))) => {
            let from = match source {
                KeySource::Env => format!("${}", config.session.key_env),
                _ => config.key_path().display().to_string(),
            };
            checks.push(Check::new("encryption_key", CheckStatus::Ok, format!("from {from}")));
            Some(key)
        }
        Ok(None) => {
            checks.push(Check::new(
                "encryption_key",
                CheckStatus::Warn,
                "no key yet; one is generated on first use",
            ));
            None
        }
        Err(e) => {
            checks.push(Check::new("encryption_key", CheckStatus::Fail, e.to_string()));
            None
        }
    };

    let store_path = config.store_path();
    let store_ok = if !store_path.exists() {
        checks.push(Check::new("session_store", CheckStatus::Warn, "no sessions stored yet"));
        false
    } else {
        match FileStore::new(&store_path).count() {
            Ok(n) => {
                checks.push(Check::new(
                    "session_store",
                    CheckStatus::Ok,
                    format!("{n} record(s) in {}", store_path.display()),
                ));
                true
            }
            Err(e) => {
                checks.push(Check::new("session_store", CheckStatus::Fail, e.to_string()));
                false
            }
        }
    };

    let current = CurrentSession::new(config.current_session_path());
    let session_id = match (current.load(), current.last()) {
        (Ok(Some(id)), _) => {
            checks.push(Check::new("current_session", CheckStatus::Ok, "active"));
            Some(id)
        }
        (Ok(None), Ok(Some(id))) => {
            checks.push(Check::new("current_session", CheckStatus::Warn, "logged out"));
            Some(id)
        }
        (Ok(None), Ok(None)) => {
            checks.push(Check::new("current_session", CheckStatus::Warn, "no session"));
            None
        }
        (Err(e), _) | (_, Err(e)) => {
            checks.push(Check::new("current_session", CheckStatus::Fail, e.to_string()));
            None
        }
    };

    if let (Some(key), Some(id), true) = (key, session_id, store_ok) {
        checks.push(stored_token_check(&key, FileStore::new(store_path), &id));
    }

    checks
}

fn stored_token_check(key: &EncryptionKey, store: FileStore, session_id: &str) -> Check {
    let vault = TokenVault::new(store, TokenCipher::new(key));
    match vault.token(session_id) {
        Ok(Some(_)) => Check::new("stored_token", CheckStatus::Ok, "decrypts with the current key"),
        Ok(None) => Check::new("stored_token", CheckStatus::Warn, "no token stored for this session"),
        Err(e) => Check::new(
            "stored_token",
            CheckStatus::Fail,
            format!("{e} (was the encryption key replaced?)"),
        ),
    }
}

/// Number of failed checks.
pub fn failures(checks: &[Check]) -> usize {
    checks.iter().filter(|c| c.status == CheckStatus::Fail).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SessionStore;
    use std::path::Path;

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        config.session.dir = dir.display().to_string();
        config
    }

    fn status_of(checks: &[Check], name: &str) -> Option<CheckStatus> {
        checks.iter().find(|c| c.name == name).map(|c| c.status)
    }

    #[test]
    fn fresh_setup_only_warns_and_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let checks = diagnose(&config, None);

        assert_eq!(failures(&checks), 0);
        assert_eq!(status_of(&checks, "encryption_key"), Some(CheckStatus::Warn));
        assert_eq!(status_of(&checks, "session_store"), Some(CheckStatus::Warn));
        assert_eq!(status_of(&checks, "stored_token"), None);
        assert!(!config.key_path().exists());
    }

    #[test]
    fn healthy_session() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let (key, _) = crypto::resolve_key(None, &config.key_path()).unwrap();
        let vault = TokenVault::new(FileStore::new(config.store_path()), TokenCipher::new(&key));
        let current = CurrentSession::new(config.current_session_path());
        let id = current.load_or_create().unwrap();
        vault.login(&id, "t.token", "alice").unwrap();

        let checks = diagnose(&config, None);
        assert_eq!(failures(&checks), 0);
        assert_eq!(status_of(&checks, "stored_token"), Some(CheckStatus::Ok));
        assert_eq!(status_of(&checks, "current_session"), Some(CheckStatus::Ok));
    }

    #[test]
    fn replaced_key_fails_token_check() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let vault = TokenVault::new(
            FileStore::new(config.store_path()),
            TokenCipher::new(&EncryptionKey::generate()),
        );
        let id = CurrentSession::new(config.current_session_path())
            .load_or_create()
            .unwrap();
        vault.login(&id, "t.token", "alice").unwrap();

        let other = EncryptionKey::generate().to_hex();
        let checks = diagnose(&config, Some(other));
        assert_eq!(status_of(&checks, "encryption_key"), Some(CheckStatus::Ok));
        assert_eq!(status_of(&checks, "stored_token"), Some(CheckStatus::Fail));
        assert_eq!(failures(&checks), 1);
    }

    #[test]
    fn corrupt_store_and_bad_key_fail() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::write(config.store_path(), "{ broken").unwrap();

        let checks = diagnose(&config, Some("not-hex".into()));
        assert_eq!(status_of(&checks, "encryption_key"), Some(CheckStatus::Fail));
        assert_eq!(status_of(&checks, "session_store"), Some(CheckStatus::Fail));
        assert_eq!(failures(&checks), 2);
        assert!(FileStore::new(config.store_path()).get("k").is_err());
    }
}
